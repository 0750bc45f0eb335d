// src/category.rs
use std::fmt;

use serde::{Deserialize, Serialize};

/// Cache/display label for the top-headlines bucket.
pub const TOP_HEADLINES_LABEL: &str = "Today's Top Headlines";

/// Country used for the top-headlines listing.
pub const TOP_HEADLINES_COUNTRY: &str = "us";

/// Topical news bucket. Drives which upstream query is issued.
///
/// Unknown identifiers are kept as `Other`, case preserved, and forwarded
/// upstream unchanged; the listing API decides whether they mean anything.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Category {
    Default,
    Business,
    Entertainment,
    Health,
    Science,
    Sports,
    Technology,
    Other(String),
}

impl Category {
    pub const KNOWN: [Category; 7] = [
        Category::Default,
        Category::Business,
        Category::Entertainment,
        Category::Health,
        Category::Science,
        Category::Sports,
        Category::Technology,
    ];

    /// Known identifiers match case-insensitively; never fails.
    pub fn parse(s: &str) -> Self {
        let raw = s.trim();
        match raw.to_ascii_lowercase().as_str() {
            "default" | "" => Category::Default,
            "business" => Category::Business,
            "entertainment" => Category::Entertainment,
            "health" => Category::Health,
            "science" => Category::Science,
            "sports" => Category::Sports,
            "technology" => Category::Technology,
            _ => Category::Other(raw.to_string()),
        }
    }

    /// Identifier used for fetching and in logs.
    pub fn as_str(&self) -> &str {
        match self {
            Category::Default => "default",
            Category::Business => "business",
            Category::Entertainment => "entertainment",
            Category::Health => "health",
            Category::Science => "science",
            Category::Sports => "sports",
            Category::Technology => "technology",
            Category::Other(s) => s.as_str(),
        }
    }

    /// Cache key and payload label. Only `Default` differs from the identifier.
    pub fn label(&self) -> &str {
        match self {
            Category::Default => TOP_HEADLINES_LABEL,
            other => other.as_str(),
        }
    }

    /// Query parameters for the top-headlines listing.
    pub fn listing_query(&self) -> (&'static str, &str) {
        match self {
            Category::Default => ("country", TOP_HEADLINES_COUNTRY),
            other => ("category", other.as_str()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Category::Other(_))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        Category::parse(&s)
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        c.as_str().to_string()
    }
}
