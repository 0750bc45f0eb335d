// src/fetch/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Listing metadata for one candidate article.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArticleRef {
    pub title: String, // dedup/display key
    pub url: String,
    pub author: Option<String>,
    pub source: String, // publisher name
    pub image: Option<String>,
}

/// An accepted article: metadata plus the extracted body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleContent {
    pub article: ArticleRef,
    pub text: String,
}

/// Fetch phase of one category: listing + download/extraction.
///
/// Implementations skip per-article failures internally; only a failure of
/// the listing itself is returned as an error.
#[async_trait::async_trait]
pub trait ArticleFetcher: Send + Sync {
    async fn fetch(&self, category: &Category) -> Result<Vec<ArticleContent>>;
    fn name(&self) -> &'static str;
}
