// src/cache.rs
//! Result cache: category label → JSON payload, absolute TTL per entry.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::category::Category;
use crate::pipeline::{AggregatedResult, CategoryResult, Summary};

#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: String, ttl: Duration);
}

struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-process cache. Expired entries read as absent and are purged on write.
#[derive(Default)]
pub struct MemoryCache {
    inner: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.inner
            .read()
            .await
            .values()
            .filter(|e| e.expires_at > now)
            .count()
    }
}

#[async_trait]
impl ResultCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let g = self.inner.read().await;
        let hit = g
            .get(key)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.value.clone());
        if hit.is_some() {
            counter!("cache_hits_total").increment(1);
        } else {
            counter!("cache_misses_total").increment(1);
        }
        hit
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) {
        let now = Instant::now();
        let mut g = self.inner.write().await;
        g.retain(|_, e| e.expires_at > now);
        g.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
    }
}

/// `{label: [summary, ...]}`
pub fn payload_value(category: &Category, summaries: &[Summary]) -> Result<Value> {
    let mut obj = Map::new();
    obj.insert(
        category.label().to_string(),
        serde_json::to_value(summaries).context("serializing summaries")?,
    );
    Ok(Value::Object(obj))
}

pub fn encode_payload(category: &Category, summaries: &[Summary]) -> Result<String> {
    serde_json::to_string(&payload_value(category, summaries)?).context("serializing payload")
}

/// What a publish step wrote.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub written: Vec<String>,
    pub retained: Vec<String>,
}

/// Write one category's result under its label.
///
/// With `retain_stale` set, a category that produced nothing does not replace
/// a live entry.
pub async fn publish_category(
    cache: &dyn ResultCache,
    result: &CategoryResult,
    ttl: Duration,
    retain_stale: bool,
) -> Result<bool> {
    let key = result.category.label();
    if retain_stale && result.summaries.is_empty() && cache.get(key).await.is_some() {
        tracing::info!(
            target: "cache",
            key,
            state = result.state.as_str(),
            "keeping previous entry"
        );
        return Ok(false);
    }
    let payload = encode_payload(&result.category, &result.summaries)?;
    cache.set(key, payload, ttl).await;
    tracing::info!(
        target: "cache",
        key,
        summaries = result.summaries.len(),
        ttl_secs = ttl.as_secs(),
        "cached"
    );
    Ok(true)
}

/// Publish every category of a coordinator run.
pub async fn publish(
    cache: &dyn ResultCache,
    aggregated: &AggregatedResult,
    ttl: Duration,
    retain_stale: bool,
) -> Result<PublishReport> {
    let mut report = PublishReport::default();
    for result in aggregated.iter() {
        let label = result.category.label().to_string();
        if publish_category(cache, result, ttl, retain_stale).await? {
            report.written.push(label);
        } else {
            report.retained.push(label);
        }
    }
    Ok(report)
}
