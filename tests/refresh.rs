// tests/refresh.rs
//
// RefreshScheduler::refresh_once: one coordinator run over every configured
// category, published into the cache under each category's label.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use headline_digest::cache::{MemoryCache, ResultCache};
use headline_digest::category::Category;
use headline_digest::config::AppConfig;
use headline_digest::Services;

use common::{contents, summarizer, ProbeModel, Script, ScriptedFetcher};

fn services(fetcher: ScriptedFetcher, cache: Arc<MemoryCache>, retain: bool) -> Services {
    let mut config = AppConfig::default();
    config.cache.retain_stale_on_failure = retain;
    Services::with_parts(
        config,
        Arc::new(fetcher),
        summarizer(Arc::new(ProbeModel::new(Duration::ZERO))),
        cache,
    )
}

fn scripted_all() -> ScriptedFetcher {
    Category::KNOWN.iter().fold(ScriptedFetcher::new(), |f, c| {
        f.with(c.clone(), Script::Articles(contents(c.as_str(), 2)))
    })
}

#[tokio::test]
async fn refresh_writes_every_label() {
    let cache = Arc::new(MemoryCache::new());
    let s = services(scripted_all(), cache.clone(), false);

    let report = s.scheduler.refresh_once().await.expect("refresh");
    assert_eq!(report.written.len(), Category::KNOWN.len());
    assert!(report.retained.is_empty());
    assert_eq!(cache.len().await, Category::KNOWN.len());

    for cat in Category::KNOWN.iter() {
        let raw = cache.get(cat.label()).await.expect("entry written");
        let v: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(v[cat.label()].as_array().unwrap().len(), 2, "{cat}");
    }
    assert!(cache.get("Today's Top Headlines").await.is_some());
}

#[tokio::test]
async fn failed_category_replaces_previous_entry_by_default() {
    let cache = Arc::new(MemoryCache::new());
    services(scripted_all(), cache.clone(), false)
        .scheduler
        .refresh_once()
        .await
        .unwrap();

    let broken = scripted_all().with(Category::Business, Script::Fail);
    services(broken, cache.clone(), false)
        .scheduler
        .refresh_once()
        .await
        .unwrap();

    assert_eq!(cache.get("business").await.unwrap(), r#"{"business":[]}"#);
}

#[tokio::test]
async fn retain_stale_keeps_previous_entry() {
    let cache = Arc::new(MemoryCache::new());
    services(scripted_all(), cache.clone(), true)
        .scheduler
        .refresh_once()
        .await
        .unwrap();

    let broken = scripted_all().with(Category::Business, Script::Fail);
    let report = services(broken, cache.clone(), true)
        .scheduler
        .refresh_once()
        .await
        .unwrap();

    assert_eq!(report.retained, vec!["business".to_string()]);
    let raw = cache.get("business").await.unwrap();
    assert!(raw.contains("business 0"), "{raw}");
}
