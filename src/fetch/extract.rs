// src/fetch/extract.rs
//! HTML page → plain body text.
//!
//! The only structural assumption is that body text lives in `<p>` elements:
//! every paragraph's text content is concatenated in document order.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static PARAGRAPH: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("static selector `p` is valid"));

/// Concatenate the text of all paragraph elements, whitespace-collapsed.
pub fn paragraph_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let words: Vec<&str> = document
        .select(&PARAGRAPH)
        .flat_map(|p| p.text())
        .flat_map(str::split_whitespace)
        .collect();
    words.join(" ")
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Body is long enough to be worth summarizing (strictly more than `min_words`).
pub fn is_substantial(text: &str, min_words: usize) -> bool {
    word_count(text) > min_words
}
