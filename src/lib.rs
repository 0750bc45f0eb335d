// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod app;
pub mod cache;
pub mod category;
pub mod config;
pub mod fetch;
pub mod metrics;
pub mod pipeline;
pub mod scheduler;
pub mod summarize;

// ---- Re-exports for stable public API ----
pub use crate::api::create_router as router;
pub use crate::app::Services;
pub use crate::category::Category;
pub use crate::pipeline::{
    AggregatedResult, CategoryPipeline, CategoryResult, PipelineCoordinator, PipelineState, Summary,
};
pub use crate::summarize::{SummarizationError, Summarizer};

use axum::Router;

/// Build the router from `AppConfig::load()` without warming the cache.
/// Misses are served through the single-category fallback.
pub async fn app() -> anyhow::Result<Router> {
    let config = config::AppConfig::load()?;
    Ok(Services::from_config(config)?.router())
}
