// tests/assist_mock.rs
// Assist client behavior without network: mock provider, cache, daily limit, factory.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serial_test::serial;

use video_funnel_planner::assist::{
    build_client, AssistClient, BoxFuture, DisabledClient, LimitedClient, MockProvider, Provider,
    Task, ENV_TEST_MODE,
};
use video_funnel_planner::categorizer::Categorizer;
use video_funnel_planner::clock::FixedClock;
use video_funnel_planner::config::assist::AssistConfig;

/// Provider that counts calls and echoes the prompt length.
#[derive(Default)]
struct CountingProvider {
    calls: Arc<AtomicU32>,
}

impl Provider for CountingProvider {
    fn generate<'a>(&'a self, _task: Task, prompt: &'a str) -> BoxFuture<'a, Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let out = format!("outline for {} chars", prompt.len());
        Box::pin(async move { Some(out) })
    }
    fn name(&self) -> &'static str {
        "counting"
    }
}

/// Counting provider that takes a while to answer.
#[derive(Default)]
struct SlowCountingProvider {
    calls: Arc<AtomicU32>,
}

impl Provider for SlowCountingProvider {
    fn generate<'a>(&'a self, _task: Task, prompt: &'a str) -> BoxFuture<'a, Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let out = format!("outline for {} chars", prompt.len());
        Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Some(out)
        })
    }
    fn name(&self) -> &'static str {
        "slow-counting"
    }
}

/// Fails on the first call, answers afterwards.
#[derive(Default)]
struct FlakyProvider {
    calls: AtomicU32,
}

impl Provider for FlakyProvider {
    fn generate<'a>(&'a self, _task: Task, _prompt: &'a str) -> BoxFuture<'a, Option<String>> {
        let first = self.calls.fetch_add(1, Ordering::SeqCst) == 0;
        Box::pin(async move { (!first).then(|| "recovered outline".to_string()) })
    }
    fn name(&self) -> &'static str {
        "flaky"
    }
}

/// Provider that never answers.
struct SilentProvider;

impl Provider for SilentProvider {
    fn generate<'a>(&'a self, _task: Task, _prompt: &'a str) -> BoxFuture<'a, Option<String>> {
        Box::pin(async { None })
    }
    fn name(&self) -> &'static str {
        "silent"
    }
}

fn card(title: &str) -> video_funnel_planner::VideoCard {
    Categorizer::default().categorize(title)
}

#[tokio::test]
async fn mock_outline_and_metadata() {
    let client = LimitedClient::new(MockProvider::default(), 10, Arc::new(FixedClock::fixed()));
    let outline = client.outline(&card("Living in Apex")).await.expect("outline");
    assert!(outline.contains("**Hook:**"));

    let meta = client
        .video_metadata("https://www.youtube.com/watch?v=xyz")
        .await
        .expect("meta");
    assert_eq!(meta.title, "Mock video");
    assert_eq!(meta.thumbnail.as_deref(), Some("https://img.example/mock.jpg"));

    assert!(client.video_metadata("https://vimeo.com/1").await.is_none());
    assert_eq!(client.provider_name(), "mock");
}

#[tokio::test]
async fn daily_limit_counts_only_remote_calls() {
    let provider = CountingProvider::default();
    let calls = provider.calls.clone();
    let client = LimitedClient::new(provider, 1, Arc::new(FixedClock::fixed()));

    let c = card("Pros and cons of Cary");
    let first = client.outline(&c).await.expect("first call within budget");
    // Same prompt is served from cache, even with the budget spent.
    let again = client.outline(&c).await.expect("cache hit");
    assert_eq!(first, again);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // A different prompt needs a remote call and the budget is gone.
    assert!(client.outline(&card("Map tour of Durham")).await.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_calls_cannot_overrun_daily_limit() {
    let provider = SlowCountingProvider::default();
    let calls = provider.calls.clone();
    let client = Arc::new(LimitedClient::new(provider, 1, Arc::new(FixedClock::fixed())));

    let handles: Vec<_> = ["Apex", "Cary", "Durham", "Garner", "Knightdale"]
        .into_iter()
        .map(|town| {
            let client = client.clone();
            let c = card(&format!("Pros and cons of {town}"));
            tokio::spawn(async move { client.outline(&c).await })
        })
        .collect();

    let mut answered = 0;
    for h in handles {
        if h.await.expect("task").is_some() {
            answered += 1;
        }
    }
    assert_eq!(answered, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_call_releases_its_slot() {
    let client = LimitedClient::new(FlakyProvider::default(), 1, Arc::new(FixedClock::fixed()));
    let c = card("Market update");
    assert!(client.outline(&c).await.is_none());
    // The failed call held the only slot while in flight; the retry gets it.
    assert!(client.outline(&c).await.is_some());
    assert!(client.outline(&card("Another idea")).await.is_none());
}

#[tokio::test]
async fn failed_calls_do_not_spend_budget() {
    let client = LimitedClient::new(SilentProvider, 1, Arc::new(FixedClock::fixed()));
    assert!(client.outline(&card("Market update")).await.is_none());
    assert!(client.outline(&card("Market update")).await.is_none());
    assert_eq!(client.provider_name(), "silent");
}

#[tokio::test]
async fn disabled_client_returns_nothing() {
    let client = DisabledClient;
    assert!(client.outline(&card("Anything")).await.is_none());
    assert!(client
        .video_metadata("https://youtu.be/abc")
        .await
        .is_none());
    assert_eq!(client.provider_name(), "disabled");
}

#[tokio::test]
#[serial]
async fn factory_respects_test_mode_and_config() {
    std::env::remove_var(ENV_TEST_MODE);
    let client = build_client(&AssistConfig::default());
    assert_eq!(client.provider_name(), "disabled");

    std::env::set_var(ENV_TEST_MODE, "mock");
    let client = build_client(&AssistConfig::default());
    std::env::remove_var(ENV_TEST_MODE);
    assert_eq!(client.provider_name(), "mock");
    assert!(client.outline(&card("Moving to Wake Forest")).await.is_some());

    // Enabled gemini without a key cannot start; falls back to disabled.
    let cfg = AssistConfig {
        enabled: true,
        ..AssistConfig::default()
    };
    assert_eq!(build_client(&cfg).provider_name(), "disabled");
}
