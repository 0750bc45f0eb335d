// tests/pipeline_category.rs
//
// CategoryPipeline terminal states and output shape, against the scripted
// fetcher and the probe model.

mod common;

use std::sync::Arc;
use std::time::Duration;

use headline_digest::category::Category;
use headline_digest::{CategoryPipeline, PipelineState};

use common::{content, contents, summarizer, ProbeModel, Script, ScriptedFetcher};

fn pipeline(fetcher: ScriptedFetcher, model: Arc<ProbeModel>, timeout: Duration) -> CategoryPipeline {
    CategoryPipeline::new(Arc::new(fetcher), summarizer(model), timeout, 3)
}

fn probe() -> Arc<ProbeModel> {
    Arc::new(ProbeModel::new(Duration::ZERO))
}

#[tokio::test]
async fn caps_at_three_summaries() {
    let f = ScriptedFetcher::new().with(Category::Business, Script::Articles(contents("biz", 5)));
    let model = probe();
    let p = pipeline(f, model.clone(), Duration::from_secs(5));

    let r = p.run(Category::Business).await;
    assert_eq!(r.state, PipelineState::Done);
    assert_eq!(r.category, Category::Business);
    assert_eq!(r.summaries.len(), 3);
    assert_eq!(model.calls(), 3, "articles past the cap are never summarized");
}

#[tokio::test]
async fn fewer_articles_than_cap() {
    let f = ScriptedFetcher::new().with(Category::Science, Script::Articles(contents("sci", 2)));
    let r = pipeline(f, probe(), Duration::from_secs(5))
        .run(Category::Science)
        .await;
    assert_eq!(r.state, PipelineState::Done);
    assert_eq!(r.summaries.len(), 2);
}

#[tokio::test]
async fn empty_listing_is_done_with_nothing() {
    let f = ScriptedFetcher::new().with(Category::Health, Script::Articles(Vec::new()));
    let model = probe();
    let r = pipeline(f, model.clone(), Duration::from_secs(5))
        .run(Category::Health)
        .await;
    assert_eq!(r.state, PipelineState::Done);
    assert!(r.summaries.is_empty());
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn slow_fetch_times_out() {
    let f = ScriptedFetcher::new().with(
        Category::Sports,
        Script::Slow(Duration::from_secs(5), contents("slow", 3)),
    );
    let model = probe();
    let p = pipeline(f, model.clone(), Duration::from_millis(100));

    let started = std::time::Instant::now();
    let r = p.run(Category::Sports).await;
    assert_eq!(r.state, PipelineState::FetchTimeout);
    assert!(r.summaries.is_empty());
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn fetch_error_is_fetch_failed() {
    let f = ScriptedFetcher::new().with(Category::Technology, Script::Fail);
    let r = pipeline(f, probe(), Duration::from_secs(5))
        .run(Category::Technology)
        .await;
    assert_eq!(r.state, PipelineState::FetchFailed);
    assert!(r.summaries.is_empty());
}

#[tokio::test]
async fn one_failed_summary_drops_only_that_article() {
    let articles = vec![content("good one"), content("poison pill"), content("good two")];
    let f = ScriptedFetcher::new().with(Category::Health, Script::Articles(articles));
    let model = Arc::new(ProbeModel::new(Duration::ZERO).failing_on("poison"));

    let r = pipeline(f, model, Duration::from_secs(5))
        .run(Category::Health)
        .await;
    assert_eq!(r.state, PipelineState::Done);
    let titles: Vec<&str> = r.summaries.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["good one", "good two"]);
}

#[tokio::test]
async fn every_summary_failing_is_summarize_failed() {
    let articles = vec![content("poison a"), content("poison b")];
    let f = ScriptedFetcher::new().with(Category::Entertainment, Script::Articles(articles));
    let model = Arc::new(ProbeModel::new(Duration::ZERO).failing_on("poison"));

    let r = pipeline(f, model, Duration::from_secs(5))
        .run(Category::Entertainment)
        .await;
    assert_eq!(r.state, PipelineState::SummarizeFailed);
    assert!(r.summaries.is_empty());
}

#[tokio::test]
async fn duplicate_titles_are_summarized_once() {
    let articles = vec![content("same"), content("same"), content("other")];
    let f = ScriptedFetcher::new().with(Category::Business, Script::Articles(articles));
    let model = probe();

    let r = pipeline(f, model.clone(), Duration::from_secs(5))
        .run(Category::Business)
        .await;
    let titles: Vec<&str> = r.summaries.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["same", "other"]);
    assert_eq!(model.calls(), 2);
}

#[tokio::test]
async fn summaries_keep_fetch_order_and_metadata() {
    let f = ScriptedFetcher::new().with(Category::Default, Script::Articles(contents("top", 3)));
    let r = pipeline(f, probe(), Duration::from_secs(5))
        .run(Category::Default)
        .await;

    assert_eq!(r.summaries.len(), 3);
    for (i, s) in r.summaries.iter().enumerate() {
        assert_eq!(s.title, format!("top {i}"));
        assert_eq!(s.summary, format!("summary of top_{i}0"));
        assert_eq!(s.author.as_deref(), Some(format!("top {i} author").as_str()));
        assert_eq!(s.source, "Test Wire");
        assert_eq!(
            s.image.as_deref(),
            Some(format!("https://news.test/top-{i}.jpg").as_str())
        );
    }
}
