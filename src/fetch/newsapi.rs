// src/fetch/newsapi.rs
use std::collections::HashSet;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::Client;
use serde::Deserialize;

use crate::category::Category;
use crate::config::app::{FetchConfig, NewsApiConfig};
use crate::fetch::extract::{is_substantial, paragraph_text, word_count};
use crate::fetch::types::{ArticleContent, ArticleFetcher, ArticleRef};

const TOP_HEADLINES_PATH: &str = "/v2/top-headlines";
// Sent as a header so the key never appears in request URLs (and thus in errors).
const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Debug, Deserialize)]
struct Listing {
    status: Option<String>,
    message: Option<String>,
    // Absent on upstream errors (bad key, rate limit); treated as zero articles.
    articles: Option<Vec<RawArticle>>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    title: Option<String>,
    url: Option<String>,
    author: Option<String>,
    source: Option<RawSource>,
    #[serde(rename = "urlToImage")]
    url_to_image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: Option<String>,
}

impl RawArticle {
    fn into_ref(self) -> Result<ArticleRef> {
        let title = self
            .title
            .map(|t| clean_field(&t))
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow!("missing title"))?;
        let url = self
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| anyhow!("missing url for '{title}'"))?;
        let source = self
            .source
            .and_then(|s| s.name)
            .map(|n| clean_field(&n))
            .filter(|n| !n.is_empty())
            .ok_or_else(|| anyhow!("missing source name for '{title}'"))?;
        Ok(ArticleRef {
            title,
            url,
            author: self.author.map(|a| clean_field(&a)).filter(|a| !a.is_empty()),
            source,
            image: self.url_to_image.filter(|u| !u.trim().is_empty()),
        })
    }
}

fn clean_field(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Why a candidate was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip {
    Metadata,
    Duplicate,
    Download,
    TooShort,
}

impl Skip {
    fn as_str(self) -> &'static str {
        match self {
            Skip::Metadata => "metadata",
            Skip::Duplicate => "duplicate",
            Skip::Download => "download",
            Skip::TooShort => "too_short",
        }
    }
}

/// Fetcher backed by a NewsAPI-compatible `top-headlines` endpoint.
pub struct NewsApiFetcher {
    client: Client,
    base_url: String,
    api_key: String,
    max_entries: usize,
    min_words: usize,
}

impl NewsApiFetcher {
    pub fn new(api: &NewsApiConfig, fetch: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("headline-digest/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(api.request_timeout_secs.max(1)))
            .build()
            .context("building http client")?;
        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            api_key: api.api_key.clone(),
            max_entries: fetch.max_entries,
            min_words: fetch.min_words,
        })
    }

    /// Step 1: one listing request. Candidates come back in upstream order.
    async fn list(&self, category: &Category) -> Result<Vec<Result<ArticleRef>>> {
        let (key, value) = category.listing_query();
        let url = format!("{}{}", self.base_url, TOP_HEADLINES_PATH);
        let resp = self
            .client
            .get(&url)
            .query(&[(key, value)])
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .context("listing request")?;
        let status = resp.status();
        let body = resp.text().await.context("listing body")?;
        let listing: Listing = serde_json::from_str(&body)
            .with_context(|| format!("malformed listing response (http {status})"))?;

        let Some(articles) = listing.articles else {
            tracing::warn!(
                target: "fetch",
                %category,
                http_status = %status,
                upstream_status = listing.status.as_deref().unwrap_or_default(),
                message = listing.message.as_deref().unwrap_or_default(),
                "listing has no articles field; treating as empty"
            );
            return Ok(Vec::new());
        };
        Ok(articles.into_iter().map(RawArticle::into_ref).collect())
    }

    async fn download(&self, url: &str) -> Result<String> {
        let html = self
            .client
            .get(url)
            .send()
            .await
            .context("article request")?
            .error_for_status()
            .context("article non-2xx")?
            .text()
            .await
            .context("article body")?;
        Ok(paragraph_text(&html))
    }

    /// Step 2: walk candidates in order until `max_entries` are accepted.
    async fn extract(
        &self,
        category: &Category,
        candidates: Vec<Result<ArticleRef>>,
    ) -> Vec<ArticleContent> {
        let mut accepted: Vec<ArticleContent> = Vec::with_capacity(self.max_entries);
        let mut seen_titles: HashSet<String> = HashSet::new();

        for candidate in candidates {
            if accepted.len() >= self.max_entries {
                break;
            }
            let article = match candidate {
                Ok(a) => a,
                Err(e) => {
                    skip(category, Skip::Metadata, "", &e);
                    continue;
                }
            };
            if seen_titles.contains(&article.title) {
                skip(category, Skip::Duplicate, &article.url, &anyhow!("duplicate title"));
                continue;
            }
            let text = match self.download(&article.url).await {
                Ok(t) => t,
                Err(e) => {
                    skip(category, Skip::Download, &article.url, &e);
                    continue;
                }
            };
            if !is_substantial(&text, self.min_words) {
                let e = anyhow!("{} words, need more than {}", word_count(&text), self.min_words);
                skip(category, Skip::TooShort, &article.url, &e);
                continue;
            }

            tracing::debug!(target: "fetch", %category, url = %article.url, "accepted article");
            counter!("fetch_articles_accepted_total").increment(1);
            seen_titles.insert(article.title.clone());
            accepted.push(ArticleContent { article, text });
        }
        accepted
    }
}

fn skip(category: &Category, reason: Skip, url: &str, err: &anyhow::Error) {
    tracing::warn!(
        target: "fetch",
        %category,
        url,
        reason = reason.as_str(),
        error = %format!("{err:#}"),
        "skipping article"
    );
    counter!("fetch_articles_skipped_total").increment(1);
}

#[async_trait]
impl ArticleFetcher for NewsApiFetcher {
    async fn fetch(&self, category: &Category) -> Result<Vec<ArticleContent>> {
        let t0 = Instant::now();
        let candidates = match self.list(category).await {
            Ok(c) => c,
            Err(e) => {
                counter!("fetch_listing_errors_total").increment(1);
                return Err(e.context(format!("listing for category '{category}'")));
            }
        };
        let listed = candidates.len();
        let accepted = self.extract(category, candidates).await;

        histogram!("fetch_duration_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        tracing::info!(
            target: "fetch",
            %category,
            listed,
            accepted = accepted.len(),
            "fetch finished"
        );
        Ok(accepted)
    }

    fn name(&self) -> &'static str {
        "newsapi"
    }
}
