//! Pure helpers used by the pattern and recommendation steps
//!
//! Nothing here performs I/O: ranking selects ads by revenue and the prompt
//! module turns ads and pattern summaries into chat messages.

pub mod prompt;
pub mod ranking;

pub use prompt::{image_prompt_parts, Performance, MAX_PROMPT_IMAGES};
pub use ranking::{bottom_performing_by_revenue, top_performing_by_revenue};
