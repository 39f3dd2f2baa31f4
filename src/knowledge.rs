//! Static creator knowledge used to ground recommendations

/// One entry of creator know-how for a brand category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatorKnowledge {
    pub creator: &'static str,
    pub brand_type: &'static str,
    pub content: &'static str,
}

const CREATOR_KNOWLEDGE: &[CreatorKnowledge] = &[
    CreatorKnowledge {
        creator: "dara_denney",
        brand_type: "beauty",
        content: "Leverage user-generated content: authentic content from real users builds \
engagement and trust, so integrate UGC that resonates with the audience.\n\
Sustainability and eco-friendly practices: shoppers favour eco-conscious products such as \
waterless formulas and sustainable packaging.",
    },
    CreatorKnowledge {
        creator: "dara_denney",
        brand_type: "shoes",
        content: "Press screenshots: media coverage and endorsements add credibility.\n\
Founder's story: the brand's origin story creates an emotional connection.\n\
Statistics ads: compelling data about product benefits appeals to analytical customers.",
    },
    CreatorKnowledge {
        creator: "alex_wong",
        brand_type: "fitness",
        content: "Workout demonstrations: show exercises with proper form and technique.\n\
Before and after transformations: real progress stories boost credibility.\n\
Challenges and routines: 30-day challenges increase engagement.\n\
Behind the scenes: show product creation, athlete partnerships or team workouts.",
    },
];

/// Knowledge text for a creator and brand type, matched case-insensitively
pub fn fetch_creator_data(creator_name: &str, brand_type: &str) -> Option<&'static str> {
    CREATOR_KNOWLEDGE
        .iter()
        .find(|entry| {
            entry.creator.eq_ignore_ascii_case(creator_name.trim())
                && entry.brand_type.eq_ignore_ascii_case(brand_type.trim())
        })
        .map(|entry| entry.content)
}
