// src/api.rs
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::HeaderName,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::sync::Mutex as AsyncMutex;
use tower_http::cors::CorsLayer;

use crate::cache::{self, ResultCache};
use crate::category::Category;
use crate::metrics::Metrics;
use crate::pipeline::CategoryPipeline;

/// Diagnostics header: `HIT` when served from cache, `MISS` after a fallback run.
pub const CACHE_HEADER: HeaderName = HeaderName::from_static("x-news-cache");

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<dyn ResultCache>,
    pub pipeline: Arc<CategoryPipeline>,
    pub ttl: Duration,
    pub flights: Arc<Flights>,
}

/// One fallback run per cache key at a time; later callers wait and re-read
/// the cache instead of hitting upstream again.
#[derive(Default)]
pub struct Flights {
    slots: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl Flights {
    fn slot(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(key.to_string()).or_default())
    }

    fn release(&self, key: &str, slot: &Arc<AsyncMutex<()>>) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // map + this caller: nobody else is waiting
        if Arc::strong_count(slot) <= 2 {
            slots.remove(key);
        }
    }

    pub fn in_flight(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

pub fn create_router(state: AppState) -> Router {
    let metrics = Metrics::init();

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/news", get(news_default))
        .route("/news/{category}", get(news_by_category))
        .with_state(state)
        .merge(metrics.router())
        .layer(CorsLayer::very_permissive())
}

async fn news_default(State(state): State<AppState>) -> impl IntoResponse {
    serve(&state, Category::Default).await
}

async fn news_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> impl IntoResponse {
    serve(&state, Category::parse(&category)).await
}

/// Always answers with a payload; an empty list when nothing is available.
///
/// Fallback results are cached only for known categories, so arbitrary path
/// segments never create cache entries.
async fn serve(state: &AppState, category: Category) -> impl IntoResponse {
    let key = category.label();
    if let Some(v) = cached(state, key).await {
        return ([(CACHE_HEADER, "HIT")], Json(v));
    }

    let slot = state.flights.slot(key);
    let response = {
        let _flight = slot.lock().await;
        match cached(state, key).await {
            Some(v) => ([(CACHE_HEADER, "HIT")], Json(v)),
            None => ([(CACHE_HEADER, "MISS")], Json(run_fallback(state, &category).await)),
        }
    };
    state.flights.release(key, &slot);
    response
}

async fn cached(state: &AppState, key: &str) -> Option<Value> {
    let raw = state.cache.get(key).await?;
    match serde_json::from_str::<Value>(&raw) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(target: "api", key, error = %e, "corrupt cache entry");
            None
        }
    }
}

async fn run_fallback(state: &AppState, category: &Category) -> Value {
    tracing::info!(target: "api", %category, "cache miss; running pipeline");
    let result = state.pipeline.run(category.clone()).await;
    if category.is_known() {
        if let Err(e) =
            cache::publish_category(state.cache.as_ref(), &result, state.ttl, false).await
        {
            tracing::warn!(target: "api", %category, error = %format!("{e:#}"), "cache write failed");
        }
    }

    let key = category.label();
    cache::payload_value(category, &result.summaries).unwrap_or_else(|_| json!({ key: [] }))
}
