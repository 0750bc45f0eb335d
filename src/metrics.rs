// src/metrics.rs
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once per process and describe all series.
    /// Later calls (tests building several apps) reuse the same handle.
    pub fn init() -> Self {
        let handle = HANDLE
            .get_or_init(|| {
                let handle = match PrometheusBuilder::new().install_recorder() {
                    Ok(h) => h,
                    Err(e) => {
                        // someone else owns the global recorder; expose an empty one
                        tracing::warn!(error = %e, "prometheus recorder not installed");
                        PrometheusBuilder::new().build_recorder().handle()
                    }
                };
                describe_all();
                handle
            })
            .clone();
        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe_all() {
    describe_counter!(
        "fetch_articles_accepted_total",
        "Articles downloaded, extracted and accepted."
    );
    describe_counter!(
        "fetch_articles_skipped_total",
        "Candidates skipped (download/parse error, missing field, too short, duplicate)."
    );
    describe_counter!("fetch_listing_errors_total", "Failed upstream listing calls.");
    describe_histogram!("fetch_duration_ms", "Fetch phase duration in milliseconds.");
    describe_counter!("summarize_calls_total", "Model invocations started.");
    describe_counter!("summarize_errors_total", "Failed summarization requests.");
    describe_histogram!(
        "summarize_duration_ms",
        "Model invocation duration in milliseconds, gate wait excluded."
    );
    describe_gauge!("summarize_inflight", "Model invocations currently running.");
    describe_counter!(
        "pipeline_outcomes_total",
        "Category pipelines by terminal state."
    );
    describe_counter!("coordinator_runs_total", "Completed coordinator runs.");
    describe_histogram!("coordinator_run_ms", "Coordinator run duration in milliseconds.");
    describe_gauge!(
        "coordinator_last_run_ts",
        "Unix ts when the coordinator last finished."
    );
    describe_counter!("cache_hits_total", "Result cache hits.");
    describe_counter!("cache_misses_total", "Result cache misses.");
}
