// src/pipeline/category.rs
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::counter;

use super::{CategoryResult, PipelineState, Summary};
use crate::category::Category;
use crate::fetch::ArticleFetcher;
use crate::summarize::Summarizer;

/// Runs fetch → summarize for exactly one category.
///
/// Never fails: fetch timeouts, listing errors and summarization errors all
/// end in a terminal [`PipelineState`] with whatever summaries were produced.
pub struct CategoryPipeline {
    fetcher: Arc<dyn ArticleFetcher>,
    summarizer: Arc<Summarizer>,
    fetch_timeout: Duration,
    max_entries: usize,
}

impl CategoryPipeline {
    pub fn new(
        fetcher: Arc<dyn ArticleFetcher>,
        summarizer: Arc<Summarizer>,
        fetch_timeout: Duration,
        max_entries: usize,
    ) -> Self {
        Self {
            fetcher,
            summarizer,
            fetch_timeout,
            max_entries: max_entries.max(1),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    pub async fn run(&self, category: Category) -> CategoryResult {
        let mut tracker = Tracker::new(&category);

        tracker.advance(PipelineState::Fetching);
        let fetched =
            match tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(&category)).await {
                Err(_) => {
                    tracing::warn!(
                        target: "pipeline",
                        %category,
                        timeout_ms = self.fetch_timeout.as_millis() as u64,
                        "fetch timed out"
                    );
                    return tracker.finish(PipelineState::FetchTimeout, Vec::new());
                }
                Ok(Err(e)) => {
                    tracing::warn!(target: "pipeline", %category, error = %format!("{e:#}"), "fetch failed");
                    return tracker.finish(PipelineState::FetchFailed, Vec::new());
                }
                Ok(Ok(articles)) => articles,
            };
        tracker.advance(PipelineState::Fetched);

        tracker.advance(PipelineState::Summarizing);
        let mut summaries = Vec::with_capacity(fetched.len().min(self.max_entries));
        let mut titles: HashSet<String> = HashSet::new();
        let mut failed = 0usize;

        // Sequential within the category; the shared gate interleaves categories.
        for content in fetched {
            if summaries.len() >= self.max_entries {
                break;
            }
            if !titles.insert(content.article.title.clone()) {
                continue;
            }
            match self.summarizer.summarize(&content.text).await {
                Ok(text) => summaries.push(Summary::from_article(content.article, text)),
                Err(e) => {
                    failed += 1;
                    tracing::warn!(
                        target: "pipeline",
                        %category,
                        title = %content.article.title,
                        error = %e,
                        "summarization failed; dropping article"
                    );
                }
            }
        }

        let terminal = if failed > 0 && summaries.is_empty() {
            PipelineState::SummarizeFailed
        } else {
            PipelineState::Done
        };
        tracker.finish(terminal, summaries)
    }
}

/// State bookkeeping + transition logging for one run.
struct Tracker<'a> {
    category: &'a Category,
    state: PipelineState,
    started: Instant,
}

impl<'a> Tracker<'a> {
    fn new(category: &'a Category) -> Self {
        Self {
            category,
            state: PipelineState::Pending,
            started: Instant::now(),
        }
    }

    fn advance(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.can_move_to(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::debug!(
            target: "pipeline",
            category = %self.category,
            from = self.state.as_str(),
            to = next.as_str(),
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "state change"
        );
        self.state = next;
    }

    fn finish(mut self, terminal: PipelineState, summaries: Vec<Summary>) -> CategoryResult {
        self.advance(terminal);
        counter!("pipeline_outcomes_total", "state" => terminal.as_str()).increment(1);
        tracing::info!(
            target: "pipeline",
            category = %self.category,
            state = terminal.as_str(),
            summaries = summaries.len(),
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "category finished"
        );
        CategoryResult {
            category: self.category.clone(),
            state: terminal,
            summaries,
        }
    }
}
