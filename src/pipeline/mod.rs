// src/pipeline/mod.rs
//! Per-category fetch/summarize pipeline and the coordinator that runs one
//! pipeline per category.

pub mod category;
pub mod coordinator;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::fetch::ArticleRef;

pub use category::CategoryPipeline;
pub use coordinator::PipelineCoordinator;

/// Per-article output served to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Summary {
    pub title: String,
    pub summary: String,
    pub author: Option<String>,
    pub source: String,
    pub image: Option<String>,
}

impl Summary {
    pub fn from_article(article: ArticleRef, summary: String) -> Self {
        Self {
            title: article.title,
            summary,
            author: article.author,
            source: article.source,
            image: article.image,
        }
    }
}

/// Lifecycle of one category pipeline.
///
/// `Pending → Fetching → (FetchTimeout | FetchFailed | Fetched) → Summarizing → (SummarizeFailed | Done)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    Pending,
    Fetching,
    FetchTimeout,
    FetchFailed,
    Fetched,
    Summarizing,
    SummarizeFailed,
    Done,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PipelineState::FetchTimeout
                | PipelineState::FetchFailed
                | PipelineState::SummarizeFailed
                | PipelineState::Done
        )
    }

    /// Legal successor states.
    pub fn can_move_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Pending, Fetching)
                | (Fetching, FetchTimeout)
                | (Fetching, FetchFailed)
                | (Fetching, Fetched)
                | (Fetched, Summarizing)
                | (Summarizing, SummarizeFailed)
                | (Summarizing, Done)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PipelineState::Pending => "pending",
            PipelineState::Fetching => "fetching",
            PipelineState::FetchTimeout => "fetch_timeout",
            PipelineState::FetchFailed => "fetch_failed",
            PipelineState::Fetched => "fetched",
            PipelineState::Summarizing => "summarizing",
            PipelineState::SummarizeFailed => "summarize_failed",
            PipelineState::Done => "done",
        }
    }
}

/// Outcome of one category for one run. Summaries are in processing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryResult {
    pub category: Category,
    pub state: PipelineState,
    pub summaries: Vec<Summary>,
}

impl CategoryResult {
    pub fn empty(category: Category, state: PipelineState) -> Self {
        Self {
            category,
            state,
            summaries: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.state == PipelineState::Done
    }
}

/// Every requested category of one coordinator run. Failed and timed-out
/// categories are present with an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedResult {
    results: BTreeMap<Category, CategoryResult>,
}

impl AggregatedResult {
    pub(crate) fn insert(&mut self, result: CategoryResult) {
        self.results.insert(result.category.clone(), result);
    }

    pub fn get(&self, category: &Category) -> Option<&CategoryResult> {
        self.results.get(category)
    }

    pub fn summaries(&self, category: &Category) -> &[Summary] {
        self.results
            .get(category)
            .map(|r| r.summaries.as_slice())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryResult> {
        self.results.values()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn contains(&self, category: &Category) -> bool {
        self.results.contains_key(category)
    }
}

impl IntoIterator for AggregatedResult {
    type Item = CategoryResult;
    type IntoIter = std::collections::btree_map::IntoValues<Category, CategoryResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_values()
    }
}
