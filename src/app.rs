// src/app.rs
//! Wires config → fetcher, summarizer, pipeline, coordinator, cache, scheduler, router.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;

use crate::api::{self, AppState, Flights};
use crate::cache::{MemoryCache, ResultCache};
use crate::config::AppConfig;
use crate::fetch::{ArticleFetcher, NewsApiFetcher};
use crate::pipeline::{CategoryPipeline, PipelineCoordinator};
use crate::scheduler::{RefreshScheduler, RefreshSchedulerCfg};
use crate::summarize::Summarizer;

pub struct Services {
    pub config: AppConfig,
    pub cache: Arc<dyn ResultCache>,
    pub pipeline: Arc<CategoryPipeline>,
    pub coordinator: PipelineCoordinator,
    pub scheduler: RefreshScheduler,
}

impl Services {
    /// Production wiring: NewsAPI fetcher, configured model, in-memory cache.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let fetcher: Arc<dyn ArticleFetcher> =
            Arc::new(NewsApiFetcher::new(&config.news_api, &config.fetch)?);
        let summarizer = Arc::new(Summarizer::from_config(&config.summarizer)?);
        let cache: Arc<dyn ResultCache> = Arc::new(MemoryCache::new());
        Ok(Self::with_parts(config, fetcher, summarizer, cache))
    }

    /// Wiring with injected collaborators.
    pub fn with_parts(
        config: AppConfig,
        fetcher: Arc<dyn ArticleFetcher>,
        summarizer: Arc<Summarizer>,
        cache: Arc<dyn ResultCache>,
    ) -> Self {
        let pipeline = Arc::new(CategoryPipeline::new(
            fetcher,
            summarizer,
            Duration::from_secs(config.fetch.timeout_secs),
            config.fetch.max_entries,
        ));
        let coordinator = PipelineCoordinator::new(Arc::clone(&pipeline));
        let scheduler = RefreshScheduler::new(
            coordinator.clone(),
            Arc::clone(&cache),
            RefreshSchedulerCfg {
                minute: config.schedule.minute,
                categories: config.schedule.categories.clone(),
                ttl: Duration::from_secs(config.cache.ttl_secs),
                retain_stale_on_failure: config.cache.retain_stale_on_failure,
            },
        );
        Self {
            config,
            cache,
            pipeline,
            coordinator,
            scheduler,
        }
    }

    pub fn router(&self) -> Router {
        api::create_router(AppState {
            cache: Arc::clone(&self.cache),
            pipeline: Arc::clone(&self.pipeline),
            ttl: Duration::from_secs(self.config.cache.ttl_secs),
            flights: Arc::new(Flights::default()),
        })
    }
}
