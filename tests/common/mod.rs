// tests/common/mod.rs
//
// Shared stubs for pipeline/coordinator/api tests: a scripted fetcher and
// a probing summarization model that records concurrency and input sizes.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use headline_digest::category::Category;
use headline_digest::fetch::{ArticleContent, ArticleFetcher, ArticleRef};
use headline_digest::summarize::{LengthBounds, Summarizer, SummaryModel};

/// Body text with `words` words spread over short sentences.
pub fn long_text(tag: &str, words: usize) -> String {
    let mut out = Vec::with_capacity(words);
    for i in 0..words {
        out.push(if i % 8 == 7 {
            format!("{tag}{i}.")
        } else {
            format!("{tag}{i}")
        });
    }
    out.join(" ")
}

pub fn article_html(tag: &str, words: usize) -> String {
    format!(
        "<html><head><title>{tag}</title></head><body><nav>menu</nav><p>{}</p><footer>x</footer></body></html>",
        long_text(tag, words)
    )
}

pub fn content(title: &str) -> ArticleContent {
    ArticleContent {
        article: ArticleRef {
            title: title.to_string(),
            url: format!("https://news.test/{}", title.replace(' ', "-")),
            author: Some(format!("{title} author")),
            source: "Test Wire".to_string(),
            image: Some(format!("https://news.test/{}.jpg", title.replace(' ', "-"))),
        },
        text: long_text(&title.replace(' ', "_"), 250),
    }
}

pub fn contents(prefix: &str, n: usize) -> Vec<ArticleContent> {
    (0..n).map(|i| content(&format!("{prefix} {i}"))).collect()
}

#[derive(Clone)]
pub enum Script {
    Articles(Vec<ArticleContent>),
    /// Sleep, then return the articles.
    Slow(Duration, Vec<ArticleContent>),
    Fail,
    Panic,
}

/// Fetcher answering from a per-category script. Unscripted categories
/// return an empty list.
#[derive(Default)]
pub struct ScriptedFetcher {
    scripts: HashMap<Category, Script>,
    calls: Mutex<Vec<Category>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, category: Category, script: Script) -> Self {
        self.scripts.insert(category, script);
        self
    }

    pub fn calls(&self) -> Vec<Category> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArticleFetcher for ScriptedFetcher {
    async fn fetch(&self, category: &Category) -> Result<Vec<ArticleContent>> {
        self.calls.lock().unwrap().push(category.clone());
        match self.scripts.get(category).cloned() {
            None => Ok(Vec::new()),
            Some(Script::Articles(a)) => Ok(a),
            Some(Script::Slow(d, a)) => {
                tokio::time::sleep(d).await;
                Ok(a)
            }
            Some(Script::Fail) => Err(anyhow!("upstream unreachable")),
            Some(Script::Panic) => panic!("scripted fetcher panic for {category}"),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Model that tracks peak concurrency and the largest input it was handed.
/// Fails on inputs containing `fail_marker`, returns "" for `empty_marker`.
pub struct ProbeModel {
    delay: Duration,
    inflight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
    max_input_chars: AtomicUsize,
    fail_marker: Option<String>,
    empty_marker: Option<String>,
}

impl ProbeModel {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            inflight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            max_input_chars: AtomicUsize::new(0),
            fail_marker: None,
            empty_marker: None,
        }
    }

    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_marker = Some(marker.to_string());
        self
    }

    pub fn empty_on(mut self, marker: &str) -> Self {
        self.empty_marker = Some(marker.to_string());
        self
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_input_chars(&self) -> usize {
        self.max_input_chars.load(Ordering::SeqCst)
    }
}

impl SummaryModel for ProbeModel {
    fn summarize(&self, text: &str, _bounds: LengthBounds) -> Result<String> {
        let now = self.inflight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.max_input_chars
            .fetch_max(text.chars().count(), Ordering::SeqCst);

        std::thread::sleep(self.delay);
        self.inflight.fetch_sub(1, Ordering::SeqCst);

        if let Some(m) = &self.fail_marker {
            if text.contains(m.as_str()) {
                return Err(anyhow!("model crashed on {m}"));
            }
        }
        if let Some(m) = &self.empty_marker {
            if text.contains(m.as_str()) {
                return Ok("   ".to_string());
            }
        }
        // deterministic: derived from the first word only
        let first = text.split_whitespace().next().unwrap_or_default();
        Ok(format!("summary of {first}"))
    }

    fn name(&self) -> &'static str {
        "probe"
    }
}

pub fn summarizer(model: Arc<ProbeModel>) -> Arc<Summarizer> {
    Arc::new(Summarizer::new(model, 2, 1024, LengthBounds::new(10, 40)).unwrap())
}
