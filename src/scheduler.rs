// src/scheduler.rs
//! Cache refresh: once at startup, then hourly at a fixed minute (UTC).

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, Timelike, Utc};
use tokio::task::JoinHandle;

use crate::cache::{self, PublishReport, ResultCache};
use crate::category::Category;
use crate::pipeline::PipelineCoordinator;

#[derive(Clone, Debug)]
pub struct RefreshSchedulerCfg {
    pub minute: u32,
    pub categories: Vec<Category>,
    pub ttl: Duration,
    pub retain_stale_on_failure: bool,
}

#[derive(Clone)]
pub struct RefreshScheduler {
    coordinator: PipelineCoordinator,
    cache: Arc<dyn ResultCache>,
    cfg: RefreshSchedulerCfg,
}

impl RefreshScheduler {
    pub fn new(
        coordinator: PipelineCoordinator,
        cache: Arc<dyn ResultCache>,
        cfg: RefreshSchedulerCfg,
    ) -> Self {
        Self {
            coordinator,
            cache,
            cfg,
        }
    }

    /// One full cycle: coordinator run over all categories, then publish.
    pub async fn refresh_once(&self) -> Result<PublishReport> {
        tracing::info!(target: "scheduler", "starting news refresh");
        let aggregated = self.coordinator.run(&self.cfg.categories).await;
        let report = cache::publish(
            self.cache.as_ref(),
            &aggregated,
            self.cfg.ttl,
            self.cfg.retain_stale_on_failure,
        )
        .await?;
        tracing::info!(
            target: "scheduler",
            written = report.written.len(),
            retained = report.retained.len(),
            "news refresh completed"
        );
        Ok(report)
    }

    /// Loop forever on a tokio task, refreshing at `HH:minute` every hour.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let now = Utc::now();
                let next = next_run_after(now, self.cfg.minute);
                let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
                tracing::info!(target: "scheduler", next = %next.to_rfc3339(), "next refresh scheduled");
                tokio::time::sleep(wait).await;

                if let Err(e) = self.refresh_once().await {
                    tracing::error!(target: "scheduler", error = %format!("{e:#}"), "news refresh failed");
                }
            }
        })
    }
}

/// First `HH:minute:00` strictly after `now`.
pub fn next_run_after(now: DateTime<Utc>, minute: u32) -> DateTime<Utc> {
    let minute = minute.min(59);
    let hour_start = now
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now);
    let candidate = hour_start + ChronoDuration::minutes(i64::from(minute));
    if candidate > now {
        candidate
    } else {
        candidate + ChronoDuration::hours(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 9, h, m, s).unwrap()
    }

    #[test]
    fn later_in_same_hour() {
        assert_eq!(next_run_after(at(10, 15, 0), 58), at(10, 58, 0));
    }

    #[test]
    fn rolls_to_next_hour_when_passed_or_equal() {
        assert_eq!(next_run_after(at(10, 58, 0), 58), at(11, 58, 0));
        assert_eq!(next_run_after(at(10, 59, 30), 58), at(11, 58, 0));
    }

    #[test]
    fn rolls_over_midnight() {
        assert_eq!(
            next_run_after(at(23, 59, 0), 58),
            Utc.with_ymd_and_hms(2025, 3, 10, 0, 58, 0).unwrap()
        );
    }
}
