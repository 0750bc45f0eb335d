// src/pipeline/coordinator.rs
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use tokio::task::JoinSet;

use super::{AggregatedResult, CategoryPipeline, CategoryResult, PipelineState};
use crate::category::Category;

/// Fans out one [`CategoryPipeline`] task per category and joins them all.
///
/// Each task hands its [`CategoryResult`] back through the join, so the
/// aggregate is only assembled after every task has terminated and no lock
/// is needed around it.
#[derive(Clone)]
pub struct PipelineCoordinator {
    pipeline: Arc<CategoryPipeline>,
}

impl PipelineCoordinator {
    pub fn new(pipeline: Arc<CategoryPipeline>) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &Arc<CategoryPipeline> {
        &self.pipeline
    }

    /// Runs every category to a terminal state. Duplicates in `categories`
    /// are run once. Categories whose task died still get an empty entry.
    pub async fn run(&self, categories: &[Category]) -> AggregatedResult {
        let t0 = Instant::now();
        let mut wanted: Vec<Category> = Vec::with_capacity(categories.len());
        for c in categories {
            if !wanted.contains(c) {
                wanted.push(c.clone());
            }
        }
        tracing::info!(target: "coordinator", categories = wanted.len(), "run started");

        let mut tasks: JoinSet<CategoryResult> = JoinSet::new();
        for category in wanted.iter().cloned() {
            let pipeline = Arc::clone(&self.pipeline);
            tasks.spawn(async move { pipeline.run(category).await });
        }

        let mut aggregated = AggregatedResult::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => aggregated.insert(result),
                Err(e) => {
                    // panicked pipeline; filled in below
                    tracing::error!(target: "coordinator", error = %e, "pipeline task failed");
                }
            }
        }
        for category in wanted {
            if !aggregated.contains(&category) {
                counter!("pipeline_outcomes_total", "state" => PipelineState::FetchFailed.as_str())
                    .increment(1);
                aggregated.insert(CategoryResult::empty(category, PipelineState::FetchFailed));
            }
        }

        let elapsed_ms = t0.elapsed().as_secs_f64() * 1_000.0;
        counter!("coordinator_runs_total").increment(1);
        histogram!("coordinator_run_ms").record(elapsed_ms);
        gauge!("coordinator_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
        tracing::info!(
            target: "coordinator",
            categories = aggregated.len(),
            succeeded = aggregated.iter().filter(|r| r.succeeded()).count(),
            summaries = aggregated.iter().map(|r| r.summaries.len()).sum::<usize>(),
            elapsed_ms = elapsed_ms as u64,
            "run finished"
        );
        aggregated
    }
}
