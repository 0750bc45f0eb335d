// src/config/app.rs
use std::path::{Path, PathBuf};
use std::{env, fs};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::category::Category;

pub const DEFAULT_CONFIG_PATH: &str = "config/news.toml";
pub const ENV_CONFIG_PATH: &str = "NEWS_CONFIG_PATH";
pub const ENV_NEWS_API_KEY: &str = "NEWS_API_KEY";
pub const ENV_NEWS_API_BASE_URL: &str = "NEWS_API_BASE_URL";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "NEWS_FETCH_TIMEOUT_SECS";
pub const ENV_CACHE_TTL_SECS: &str = "NEWS_CACHE_TTL_SECS";
pub const ENV_SUMMARIZER_PROVIDER: &str = "SUMMARIZER_PROVIDER";
pub const ENV_HF_API_TOKEN: &str = "HF_API_TOKEN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub news_api: NewsApiConfig,
    pub fetch: FetchConfig,
    pub summarizer: SummarizerConfig,
    pub cache: CacheConfig,
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsApiConfig {
    pub base_url: String,
    /// "ENV" means: read from NEWS_API_KEY
    pub api_key: String,
    pub request_timeout_secs: u64,
}

impl Default for NewsApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://newsapi.org".to_string(),
            api_key: "ENV".to_string(),
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Accepted articles per category (MAX_ENTRIES).
    pub max_entries: usize,
    /// An article body must have strictly more words than this.
    pub min_words: usize,
    /// Deadline for the whole fetch phase of one category.
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_entries: 3,
            min_words: 200,
            timeout_secs: 40,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// "local" | "huggingface"
    pub provider: String,
    pub max_concurrency: usize,
    pub max_input_chars: usize,
    pub min_length: usize,
    pub max_length: usize,
    pub model: String,
    pub endpoint: Option<String>,
    /// "ENV" means: read from HF_API_TOKEN
    pub api_token: String,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            provider: "local".to_string(),
            max_concurrency: 2,
            max_input_chars: 1024,
            min_length: 130,
            max_length: 200,
            model: "facebook/bart-large-cnn".to_string(),
            endpoint: None,
            api_token: "ENV".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    /// Keep the previous cache entry when a category produced nothing.
    pub retain_stale_on_failure: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 86_400,
            retain_stale_on_failure: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Minute of every hour (UTC) at which the refresh runs.
    pub minute: u32,
    pub categories: Vec<Category>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            minute: 58,
            categories: Category::KNOWN.to_vec(),
        }
    }
}

impl AppConfig {
    /// Load using env var + fallback:
    /// 1) $NEWS_CONFIG_PATH (must exist)
    /// 2) config/news.toml
    /// 3) built-in defaults
    ///
    /// Environment overrides are applied last.
    pub fn load() -> Result<Self> {
        let cfg = if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                bail!("{ENV_CONFIG_PATH} points to non-existent path {}", pb.display());
            }
            Self::from_file(&pb)?
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
        } else {
            Self::default()
        };
        cfg.finish()
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&s).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Apply env overrides, resolve "ENV" secrets, validate.
    pub fn finish(mut self) -> Result<Self> {
        if let Ok(v) = env::var(ENV_NEWS_API_BASE_URL) {
            self.news_api.base_url = v;
        }
        if let Some(v) = parse_u64_env(ENV_FETCH_TIMEOUT_SECS)? {
            self.fetch.timeout_secs = v;
        }
        if let Some(v) = parse_u64_env(ENV_CACHE_TTL_SECS)? {
            self.cache.ttl_secs = v;
        }
        if let Ok(v) = env::var(ENV_SUMMARIZER_PROVIDER) {
            self.summarizer.provider = v;
        }
        self.summarizer.provider = self.summarizer.provider.trim().to_lowercase();

        if self.news_api.api_key.trim().eq_ignore_ascii_case("env") {
            // Missing key is not fatal: listing fails per category and the
            // service still serves (empty) payloads.
            self.news_api.api_key = env::var(ENV_NEWS_API_KEY).unwrap_or_default();
            if self.news_api.api_key.is_empty() {
                tracing::warn!("{ENV_NEWS_API_KEY} is not set; upstream listing will fail");
            }
        }
        if self.summarizer.api_token.trim().eq_ignore_ascii_case("env") {
            self.summarizer.api_token = env::var(ENV_HF_API_TOKEN).unwrap_or_default();
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fetch.max_entries == 0 {
            bail!("fetch.max_entries must be at least 1");
        }
        if self.fetch.timeout_secs == 0 {
            bail!("fetch.timeout_secs must be at least 1");
        }
        if self.summarizer.max_concurrency == 0 {
            bail!("summarizer.max_concurrency must be at least 1");
        }
        if self.summarizer.max_input_chars == 0 {
            bail!("summarizer.max_input_chars must be at least 1");
        }
        if self.summarizer.min_length > self.summarizer.max_length {
            bail!(
                "summarizer.min_length ({}) exceeds max_length ({})",
                self.summarizer.min_length,
                self.summarizer.max_length
            );
        }
        if self.schedule.minute > 59 {
            bail!("schedule.minute must be in 0..=59");
        }
        if self.schedule.categories.is_empty() {
            bail!("schedule.categories must not be empty");
        }
        Ok(())
    }
}

fn parse_u64_env(key: &str) -> Result<Option<u64>> {
    match env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<u64>()
            .map(Some)
            .with_context(|| format!("{key} must be an unsigned integer")),
        Err(_) => Ok(None),
    }
}
