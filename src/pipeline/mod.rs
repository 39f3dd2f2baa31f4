//! Sequential workflow pipeline
//!
//! A pipeline is an ordered list of [`WorkflowStep`]s run against a
//! [`PipelineContext`]. Each step declares the keys it requires and the one
//! key it writes. Before a step runs its preconditions are checked; the first
//! failure aborts the run and is returned to the caller.
//!
//! ```no_run
//! use std::sync::Arc;
//! use creative_insights::config::AnalysisConfig;
//! use creative_insights::genai::MockModelInvoker;
//! use creative_insights::meta::MockAdsProvider;
//! use creative_insights::pipeline::*;
//!
//! # async fn run() -> creative_insights::error::InsightsResult<()> {
//! let invoker = Arc::new(MockModelInvoker::new());
//! let config = AnalysisConfig::default();
//!
//! let pipeline = WorkflowPipeline::builder("creative-insights")
//!     .seed_keys(&[ContextKey::AccountId, ContextKey::AccessToken])
//!     .add_task(FetchAdsStep::new(Arc::new(MockAdsProvider::new(vec![]))))
//!     .add_task(FindPatternStep::high(invoker.clone(), &config))
//!     .build()?;
//!
//! let initial = PipelineContext::new()
//!     .with_text(ContextKey::AccountId, "act_123")?
//!     .with_text(ContextKey::AccessToken, "token")?;
//! let context = pipeline.execute(initial).await?;
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod core;
pub mod executor;
pub mod steps;

// Re-export main types
pub use context::{ContextKey, ContextMetadata, ContextValue, PipelineContext, ValueKind};
pub use self::core::{validate_required_keys, PipelineReport, PipelineStep, StepResult};
pub use executor::{PipelineBuilder, PipelineRun, WorkflowPipeline};
pub use steps::{
    FetchAdsStep, FindPatternStep, GenerateRecommendationsStep, IdentifyBrandTypeStep,
    WorkflowStep,
};
