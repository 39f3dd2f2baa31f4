use super::context::{ContextKey, PipelineContext};
use super::core::{PipelineReport, StepResult};
use super::steps::WorkflowStep;
use crate::error::{InsightsError, InsightsResult};
use std::collections::BTreeSet;
use std::time::Instant;

/// Sequential executor over a fixed list of workflow steps
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use creative_insights::meta::MockAdsProvider;
/// use creative_insights::pipeline::{ContextKey, FetchAdsStep, PipelineContext, WorkflowPipeline};
///
/// # async fn run() -> creative_insights::error::InsightsResult<()> {
/// let pipeline = WorkflowPipeline::builder("insights")
///     .add_task(FetchAdsStep::new(Arc::new(MockAdsProvider::new(vec![]))))
///     .build()?;
///
/// let context = PipelineContext::new()
///     .with_text(ContextKey::AccountId, "act_123")?
///     .with_text(ContextKey::AccessToken, "token")?;
/// let context = pipeline.execute(context).await?;
/// # Ok(())
/// # }
/// ```
pub struct WorkflowPipeline {
    name: String,
    steps: Vec<WorkflowStep>,
}

/// Final context of a successful run together with its timing report
#[derive(Debug)]
pub struct PipelineRun {
    pub context: PipelineContext,
    pub report: PipelineReport,
}

impl WorkflowPipeline {
    /// Create a new pipeline builder
    pub fn builder(name: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Step names in execution order
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    /// Run every step in order and return the final context
    ///
    /// Each step is validated right before it runs. The first failing step
    /// aborts the run; no later step is validated or executed.
    pub async fn execute(&self, initial: PipelineContext) -> InsightsResult<PipelineContext> {
        self.execute_with_report(initial)
            .await
            .map(|run| run.context)
    }

    /// Same as [`execute`](Self::execute), also returning per-step timings
    pub async fn execute_with_report(&self, initial: PipelineContext) -> InsightsResult<PipelineRun> {
        let total = self.steps.len();
        let run_id = initial.run_id().to_string();
        tracing::info!(
            target: "pipeline",
            "Starting pipeline '{}' with {} steps (run: {})",
            self.name,
            total,
            run_id
        );

        let pipeline_start = Instant::now();
        let mut step_results = Vec::with_capacity(total);
        let mut context = initial;

        for (index, step) in self.steps.iter().enumerate() {
            let step_name = step.name();

            if let Err(e) = step.validate(&context) {
                tracing::error!(
                    target: "pipeline",
                    "Step '{}' precondition failed: {} (run: {})",
                    step_name,
                    e,
                    run_id
                );
                return Err(e);
            }

            tracing::info!(
                target: "pipeline",
                "Executing step {}/{}: {} (run: {})",
                index + 1,
                total,
                step_name,
                run_id
            );

            let step_start = Instant::now();
            context = match step.execute(context).await {
                Ok(next) => next,
                Err(e) => {
                    tracing::error!(
                        target: "pipeline",
                        "Step '{}' failed after {:.2}s: {} (run: {})",
                        step_name,
                        step_start.elapsed().as_secs_f64(),
                        e,
                        run_id
                    );
                    return Err(e);
                }
            };
            let duration = step_start.elapsed();

            tracing::info!(
                target: "pipeline",
                "Step '{}' completed in {:.2}s (run: {})",
                step_name,
                duration.as_secs_f64(),
                run_id
            );
            step_results.push(StepResult::new(step_name, step.output_key(), duration));
        }

        let total_duration = pipeline_start.elapsed();
        tracing::info!(
            target: "pipeline",
            "Pipeline '{}' completed in {:.2}s (run: {})",
            self.name,
            total_duration.as_secs_f64(),
            run_id
        );

        Ok(PipelineRun {
            context,
            report: PipelineReport {
                pipeline_name: self.name.clone(),
                step_results,
                total_duration,
            },
        })
    }
}

/// Builder for constructing pipelines
pub struct PipelineBuilder {
    name: String,
    steps: Vec<WorkflowStep>,
    seed_keys: Option<Vec<ContextKey>>,
}

impl PipelineBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            seed_keys: None,
        }
    }

    /// Append a step; steps run in the order they are added
    pub fn add_task(mut self, step: impl Into<WorkflowStep>) -> Self {
        self.steps.push(step.into());
        self
    }

    /// Declare the keys the initial context will hold
    ///
    /// Enables the dependency check in [`build`](Self::build).
    pub fn seed_keys(mut self, keys: &[ContextKey]) -> Self {
        self.seed_keys = Some(keys.to_vec());
        self
    }

    /// Finalize the pipeline
    ///
    /// With seed keys declared, every required key of every step must be
    /// seeded or written by an earlier step.
    pub fn build(self) -> InsightsResult<WorkflowPipeline> {
        if let Some(seed) = &self.seed_keys {
            let mut available: BTreeSet<ContextKey> = seed.iter().copied().collect();
            for step in &self.steps {
                if let Some(key) = step
                    .required_keys()
                    .iter()
                    .find(|key| !available.contains(*key))
                {
                    return Err(InsightsError::UnsatisfiedDependency {
                        step: step.name().to_string(),
                        key: key.to_string(),
                    });
                }
                available.insert(step.output_key());
            }
        }

        Ok(WorkflowPipeline {
            name: self.name,
            steps: self.steps,
        })
    }
}
