// src/summarize/model.rs
//! Summarization model abstraction + the local extractive model.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

/// Failure of one summarization request.
#[derive(Debug, thiserror::Error)]
pub enum SummarizationError {
    #[error("summarization gate is closed")]
    GateClosed,
    #[error("summarization worker failed: {0}")]
    Worker(String),
    #[error("model invocation failed: {0:#}")]
    Model(anyhow::Error),
    #[error("model returned an empty summary")]
    Empty,
}

/// Output length policy, in words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthBounds {
    pub min: usize,
    pub max: usize,
}

impl LengthBounds {
    pub fn new(min: usize, max: usize) -> Self {
        Self {
            min: min.min(max),
            max,
        }
    }
}

/// A loaded model instance.
///
/// `summarize` is blocking and may be CPU/memory heavy. It is only ever called
/// from the blocking worker pool, never from async tasks directly.
pub trait SummaryModel: Send + Sync + 'static {
    fn summarize(&self, text: &str, bounds: LengthBounds) -> anyhow::Result<String>;
    fn name(&self) -> &'static str;
}

static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[.!?]+["')\]]*\s+"#).expect("sentence regex"));

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "and", "are", "as", "at", "be", "been", "but", "by", "for", "from", "had",
        "has", "have", "he", "her", "his", "i", "in", "is", "it", "its", "not", "of", "on",
        "or", "said", "she", "that", "the", "their", "they", "this", "to", "was", "we", "were",
        "which", "will", "with", "would", "you",
    ]
    .into_iter()
    .collect()
});

pub(crate) fn split_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END.find_iter(text) {
        let s = text[start..m.end()].trim();
        if !s.is_empty() {
            out.push(s);
        }
        start = m.end();
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

fn content_words(sentence: &str) -> impl Iterator<Item = String> + '_ {
    sentence
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| w.len() > 1 && !STOPWORDS.contains(w.as_str()))
}

/// Extractive summarizer: scores sentences by normalized content-word
/// frequency and emits the best ones in document order.
///
/// Deterministic, so repeated runs over the same article give the same text.
#[derive(Debug, Default, Clone)]
pub struct FrequencyModel;

impl SummaryModel for FrequencyModel {
    fn summarize(&self, text: &str, bounds: LengthBounds) -> anyhow::Result<String> {
        let sentences = split_sentences(text);
        if sentences.is_empty() {
            anyhow::bail!("no sentences in input");
        }

        let mut freq: HashMap<String, f64> = HashMap::new();
        for s in &sentences {
            for w in content_words(s) {
                *freq.entry(w).or_default() += 1.0;
            }
        }
        let top = freq.values().cloned().fold(1.0_f64, f64::max);

        let mut ranked: Vec<(usize, f64)> = sentences
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let (sum, n) = content_words(s).fold((0.0, 0usize), |(sum, n), w| {
                    (sum + freq.get(&w).copied().unwrap_or(0.0) / top, n + 1)
                });
                let score = if n == 0 { 0.0 } else { sum / (n as f64).sqrt() };
                (i, score)
            })
            .collect();
        // best first; earlier sentence wins ties
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut picked: Vec<usize> = Vec::new();
        let mut words = 0usize;
        for (i, _) in ranked {
            if words >= bounds.min.max(1) {
                break;
            }
            let n = sentences[i].split_whitespace().count();
            if words > 0 && words + n > bounds.max {
                continue;
            }
            picked.push(i);
            words += n;
        }
        picked.sort_unstable();

        let joined = picked
            .into_iter()
            .map(|i| sentences[i])
            .collect::<Vec<_>>()
            .join(" ");
        Ok(cap_words(&joined, bounds.max))
    }

    fn name(&self) -> &'static str {
        "local-frequency"
    }
}

/// Hard cap on output words.
pub(crate) fn cap_words(text: &str, max: usize) -> String {
    text.split_whitespace()
        .take(max.max(1))
        .collect::<Vec<_>>()
        .join(" ")
}
