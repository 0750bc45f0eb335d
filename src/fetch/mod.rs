// src/fetch/mod.rs
pub mod extract;
pub mod newsapi;
pub mod types;

pub use newsapi::NewsApiFetcher;
pub use types::{ArticleContent, ArticleFetcher, ArticleRef};
