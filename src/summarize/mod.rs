// src/summarize/mod.rs
//! Summarizer service: owns the loaded model and the process-wide gate.
//!
//! The gate bounds how many model invocations run at once no matter how many
//! category pipelines are summarizing. Each invocation runs on tokio's blocking
//! pool and holds its permit until the blocking call returns, so an abandoned
//! caller can never let a third invocation start early.

pub mod inference_api;
pub mod model;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Result};
use metrics::{counter, gauge, histogram};
use tokio::sync::Semaphore;

use crate::config::app::SummarizerConfig;
use inference_api::{InferenceApiModel, DEFAULT_ENDPOINT};
pub use model::{FrequencyModel, LengthBounds, SummarizationError, SummaryModel};

pub struct Summarizer {
    model: Arc<dyn SummaryModel>,
    gate: Arc<Semaphore>,
    max_concurrency: usize,
    max_input_chars: usize,
    bounds: LengthBounds,
}

impl Summarizer {
    /// `max_concurrency` is the hard ceiling of in-flight model calls.
    pub fn new(
        model: Arc<dyn SummaryModel>,
        max_concurrency: usize,
        max_input_chars: usize,
        bounds: LengthBounds,
    ) -> Result<Self> {
        if max_concurrency == 0 {
            bail!("summarizer max_concurrency must be at least 1");
        }
        if max_input_chars == 0 {
            bail!("summarizer max_input_chars must be at least 1");
        }
        Ok(Self {
            model,
            gate: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
            max_input_chars,
            bounds,
        })
    }

    /// Build the configured backend.
    pub fn from_config(cfg: &SummarizerConfig) -> Result<Self> {
        let model: Arc<dyn SummaryModel> = match cfg.provider.as_str() {
            "local" => Arc::new(FrequencyModel),
            "huggingface" => Arc::new(InferenceApiModel::new(
                cfg.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT),
                &cfg.model,
                &cfg.api_token,
            )?),
            other => bail!("unsupported summarizer provider: {other}"),
        };
        tracing::info!(
            target: "summarize",
            provider = model.name(),
            max_concurrency = cfg.max_concurrency,
            max_input_chars = cfg.max_input_chars,
            "summarizer ready"
        );
        Self::new(
            model,
            cfg.max_concurrency,
            cfg.max_input_chars,
            LengthBounds::new(cfg.min_length, cfg.max_length),
        )
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    /// Summarize one article body. Input is cut to `max_input_chars` first.
    pub async fn summarize(&self, text: &str) -> Result<String, SummarizationError> {
        let input = truncate_chars(text, self.max_input_chars).to_string();

        let permit = self
            .gate
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| SummarizationError::GateClosed)?;

        let model = Arc::clone(&self.model);
        let bounds = self.bounds;
        let t0 = Instant::now();
        counter!("summarize_calls_total").increment(1);

        let joined = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let _inflight = Inflight::enter();
            model.summarize(&input, bounds)
        })
        .await;

        histogram!("summarize_duration_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        let result = match joined {
            Ok(Ok(s)) if s.trim().is_empty() => Err(SummarizationError::Empty),
            Ok(Ok(s)) => Ok(s.trim().to_string()),
            Ok(Err(e)) => Err(SummarizationError::Model(e)),
            Err(e) => Err(SummarizationError::Worker(e.to_string())),
        };
        if result.is_err() {
            counter!("summarize_errors_total").increment(1);
        }
        result
    }
}

/// Keeps `summarize_inflight` accurate for the lifetime of one model call.
struct Inflight;

impl Inflight {
    fn enter() -> Self {
        gauge!("summarize_inflight").increment(1.0);
        Inflight
    }
}

impl Drop for Inflight {
    fn drop(&mut self) {
        gauge!("summarize_inflight").decrement(1.0);
    }
}

/// Prefix of at most `max` characters, cut on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
