use crate::genai::{ChatMessage, ContentPart};
use crate::models::AdMetricsWithImages;

/// Hard cap on image fragments in one prompt
pub const MAX_PROMPT_IMAGES: usize = 40;

const STRATEGIST_PERSONA: &str = "You are an expert Meta Ads creative strategist with deep expertise in \
visual creative analysis, discount strategy, ROAS improvement and customer psychology.";

const BRAND_TYPE_SYSTEM: &str = "You are an expert Meta Ads creative strategist.";

const BRAND_TYPE_INSTRUCTIONS: &str = "Based on the ad creatives above, identify the type of brand \
that runs them. Answer with exactly one of the allowed brand types.";

const RECOMMENDATIONS_EXTRACTION: &str = "Using the analysis you just wrote, list what is working, \
what is not working and a short overall recommendation for the creative team.";

/// Which end of the revenue ranking a pattern prompt describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Performance {
    High,
    Low,
}

impl Performance {
    pub fn label(&self) -> &'static str {
        match self {
            Performance::High => "high-performing",
            Performance::Low => "low-performing",
        }
    }
}

/// Image fragments for `ads`, in ad order, stopping at `max_images`
pub fn image_prompt_parts(ads: &[AdMetricsWithImages], max_images: usize) -> Vec<ContentPart> {
    ads.iter()
        .flat_map(|ad| ad.image_urls.iter())
        .take(max_images)
        .map(|url| ContentPart::image(url.as_str()))
        .collect()
}

/// Messages asking the model to classify the brand behind `ads`
pub fn brand_type_messages(ads: &[AdMetricsWithImages], max_images: usize) -> Vec<ChatMessage> {
    let mut parts = image_prompt_parts(ads, max_images);
    parts.push(ContentPart::text(BRAND_TYPE_INSTRUCTIONS));
    vec![
        ChatMessage::system(BRAND_TYPE_SYSTEM),
        ChatMessage::user_parts(parts),
    ]
}

/// Messages asking the model to summarize creative patterns of `ads`
pub fn pattern_messages(
    performance: Performance,
    ads: &[AdMetricsWithImages],
    max_images: usize,
) -> Vec<ChatMessage> {
    let label = performance.label();
    let system = format!(
        "{} Your task is to analyze static ad creatives and find the patterns they have in common.",
        STRATEGIST_PERSONA
    );
    let instructions = format!(
        "These are {label} static ads. Identify the creative patterns they share and group the ads \
by pattern. Look at headlines, calls to action, psychological triggers, visuals and offers. \
Back every pattern with concrete examples from the images."
    );

    let mut parts = image_prompt_parts(ads, max_images);
    parts.push(ContentPart::text(instructions));
    vec![ChatMessage::system(system), ChatMessage::user_parts(parts)]
}

/// Messages asking for a free-text "what's working / what's not" synthesis
pub fn recommendation_messages(
    high_patterns: &str,
    low_patterns: &str,
    creator_knowledge: Option<&str>,
) -> Vec<ChatMessage> {
    let system = format!(
        "{} Your task is to compare creative patterns of high- and low-performing ads and tell the \
creative team what works and what does not.",
        STRATEGIST_PERSONA
    );

    let mut user = format!(
        "Patterns found in high-performing static ads:\n{high_patterns}\n\n\
Patterns found in low-performing static ads:\n{low_patterns}\n"
    );
    if let Some(knowledge) = creator_knowledge {
        user.push_str(&format!("\nExpert knowledge for this brand category:\n{knowledge}\n"));
    }
    user.push_str(
        "\nExplain what is working, what is not working, and how the low-performing ads can be improved.",
    );

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Recommendation messages followed by the synthesis and an extraction request
pub fn recommendation_extraction_messages(
    high_patterns: &str,
    low_patterns: &str,
    creator_knowledge: Option<&str>,
    synthesis: &str,
) -> Vec<ChatMessage> {
    let mut messages = recommendation_messages(high_patterns, low_patterns, creator_knowledge);
    messages.push(ChatMessage::assistant(synthesis));
    messages.push(ChatMessage::user(RECOMMENDATIONS_EXTRACTION));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genai::MessageContent;
    use crate::models::fixtures::ad;

    fn urls(parts: &[ContentPart]) -> Vec<String> {
        parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::ImageUrl { image_url } => Some(image_url.url.clone()),
                ContentPart::Text { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_image_parts_capped_at_forty() {
        // 5 ads with 10 images each
        let ads: Vec<_> = (0..5)
            .map(|a| {
                let owned: Vec<String> = (0..10).map(|i| format!("https://img/{a}/{i}")).collect();
                let refs: Vec<&str> = owned.iter().map(String::as_str).collect();
                ad(&a.to_string(), 1.0, &refs)
            })
            .collect();

        let parts = image_prompt_parts(&ads, MAX_PROMPT_IMAGES);
        assert_eq!(parts.len(), 40);

        let expected: Vec<String> = ads
            .iter()
            .flat_map(|a| a.image_urls.clone())
            .take(40)
            .collect();
        assert_eq!(urls(&parts), expected);
    }

    #[test]
    fn test_image_parts_keep_ad_order() {
        let ads = vec![ad("1", 1.0, &["a", "b"]), ad("2", 1.0, &[]), ad("3", 1.0, &["c"])];
        assert_eq!(urls(&image_prompt_parts(&ads, 40)), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_pattern_messages_end_with_instructions() {
        let ads = vec![ad("1", 1.0, &["a"])];
        let messages = pattern_messages(Performance::Low, &ads, 40);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].image_count(), 1);
        match &messages[1].content {
            MessageContent::Parts(parts) => {
                assert!(!parts.last().unwrap().is_image());
            }
            MessageContent::Text(_) => panic!("expected mixed content"),
        }
        assert!(messages[1].text().contains("low-performing"));
    }

    #[test]
    fn test_recommendation_messages_include_knowledge() {
        let with = recommendation_messages("bold colors", "busy layouts", Some("use UGC"));
        assert!(with[1].text().contains("bold colors"));
        assert!(with[1].text().contains("busy layouts"));
        assert!(with[1].text().contains("use UGC"));

        let without = recommendation_messages("bold colors", "busy layouts", None);
        assert!(!without[1].text().contains("Expert knowledge"));
    }

    #[test]
    fn test_extraction_messages_append_synthesis() {
        let messages = recommendation_extraction_messages("h", "l", None, "the synthesis");
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[2].text(), "the synthesis");
    }
}
