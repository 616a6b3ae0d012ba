// src/assist.rs
//! AI assist: script outlines for cards and title/thumbnail lookup for inspiration videos.
//!
//! Provider abstraction + in-memory cache + daily limit. Every failure path collapses to
//! `None`; assist output is a convenience and never fails a request.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

use crate::card::{InspirationLink, VideoCard};
use crate::clock::{Clock, SystemClock};
use crate::config::assist::AssistConfig;
use crate::logging::anon_hash;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub const ENV_TEST_MODE: &str = "ASSIST_TEST_MODE";
pub const OUTLINE_HEADER: &str = "### AI SCRIPT STRATEGY";

const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

static JSON_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("json object regex"));

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMeta {
    pub title: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// Trait object used by the HTTP handlers.
pub trait AssistClient: Send + Sync {
    /// Markdown outline (hook, four points, CTA) for `card`.
    fn outline<'a>(&'a self, card: &'a VideoCard) -> BoxFuture<'a, Option<String>>;
    /// Title and thumbnail of a YouTube video. Non-YouTube urls yield `None`.
    fn video_metadata<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Option<VideoMeta>>;
    /// Provider name for diagnostics/headers.
    fn provider_name(&self) -> &'static str;
}

pub type DynAssist = Arc<dyn AssistClient>;

/// Which model a prompt goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Outline,
    Metadata,
}

pub fn outline_prompt(card: &VideoCard) -> String {
    format!(
        "Create a YouTube script outline for a real estate video. Title: \"{}\". Funnel: {}. Format: {}. Include a hook, 4 main points, and a CTA. Use Markdown.",
        card.title, card.funnel_stage, card.format_type
    )
}

pub fn metadata_prompt(url: &str) -> String {
    format!(
        "Find the exact video title and a thumbnail URL for this YouTube video: {url}. Return ONLY a JSON object: {{\"title\": \"String\", \"thumbnail\": \"String\"}}"
    )
}

pub fn is_youtube_url(url: &str) -> bool {
    url.contains("youtube.com") || url.contains("youtu.be")
}

/// First `{` to last `}` of a model reply, parsed as `VideoMeta`.
pub fn parse_video_meta(reply: &str) -> Option<VideoMeta> {
    let m = JSON_OBJECT.find(reply)?;
    let meta: VideoMeta = serde_json::from_str(m.as_str()).ok()?;
    if meta.title.trim().is_empty() {
        return None;
    }
    Some(meta)
}

/// Notes with the outline appended under its header.
pub fn append_outline(notes: &str, outline: &str) -> String {
    let mut out = String::with_capacity(notes.len() + outline.len() + 32);
    if !notes.is_empty() {
        out.push_str(notes);
        out.push_str("\n\n");
    }
    out.push_str(OUTLINE_HEADER);
    out.push('\n');
    out.push_str(outline);
    out
}

pub fn apply_video_meta(link: &mut InspirationLink, meta: VideoMeta) {
    link.title = Some(meta.title);
    if meta.thumbnail.is_some() {
        link.thumbnail = meta.thumbnail;
    }
}

/// Factory: build a client according to config and environment variables.
///
/// * If `ASSIST_TEST_MODE=mock`, returns a deterministic mock client.
/// * Else if `config.enabled==false`, returns a disabled client.
/// * Else builds the configured provider wrapped with caching + daily limit.
pub fn build_client(config: &AssistConfig) -> DynAssist {
    let mock_mode = std::env::var(ENV_TEST_MODE)
        .map(|v| v == "mock")
        .unwrap_or(false);
    if mock_mode || (config.enabled && config.provider == "mock") {
        return Arc::new(LimitedClient::new(
            MockProvider::default(),
            config.daily_limit,
            Arc::new(SystemClock),
        ));
    }

    if !config.enabled {
        return Arc::new(DisabledClient);
    }

    match GeminiProvider::new(config) {
        Ok(provider) => {
            info!(
                target: "assist",
                provider = "gemini",
                key_len = config.api_key.len(),
                "assist client ready"
            );
            Arc::new(LimitedClient::new(
                provider,
                config.daily_limit,
                Arc::new(SystemClock),
            ))
        }
        Err(e) => {
            warn!(target: "assist", error = ?e, "assist provider unavailable, disabling");
            Arc::new(DisabledClient)
        }
    }
}

// ------------------------------------------------------------
// Provider abstraction + concrete providers
// ------------------------------------------------------------

/// Low-level provider: does the remote call and returns the raw reply text.
pub trait Provider: Send + Sync + 'static {
    fn generate<'a>(&'a self, task: Task, prompt: &'a str) -> BoxFuture<'a, Option<String>>;
    fn name(&self) -> &'static str;
}

/// Gemini `generateContent` over HTTPS.
pub struct GeminiProvider {
    http: reqwest::Client,
    api_key: String,
    outline_model: String,
    metadata_model: String,
}

impl GeminiProvider {
    pub fn new(config: &AssistConfig) -> anyhow::Result<Self> {
        if config.api_key.trim().is_empty() {
            anyhow::bail!("gemini provider needs an api key");
        }
        let http = reqwest::Client::builder()
            .user_agent("video-funnel-planner/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            outline_model: config.outline_model.clone(),
            metadata_model: config.metadata_model.clone(),
        })
    }
}

impl Provider for GeminiProvider {
    fn generate<'a>(&'a self, task: Task, prompt: &'a str) -> BoxFuture<'a, Option<String>> {
        Box::pin(async move {
            #[derive(Serialize)]
            struct Part<'a> {
                text: &'a str,
            }
            #[derive(Serialize)]
            struct Content<'a> {
                parts: Vec<Part<'a>>,
            }
            #[derive(Serialize)]
            struct Req<'a> {
                contents: Vec<Content<'a>>,
                #[serde(skip_serializing_if = "Vec::is_empty")]
                tools: Vec<serde_json::Value>,
            }
            #[derive(Deserialize)]
            struct Resp {
                #[serde(default)]
                candidates: Vec<Candidate>,
            }
            #[derive(Deserialize)]
            struct Candidate {
                content: RespContent,
            }
            #[derive(Deserialize)]
            struct RespContent {
                #[serde(default)]
                parts: Vec<RespPart>,
            }
            #[derive(Deserialize)]
            struct RespPart {
                #[serde(default)]
                text: String,
            }

            let (model, tools) = match task {
                Task::Outline => (&self.outline_model, Vec::new()),
                // Metadata lookups need search grounding to see the video page.
                Task::Metadata => (
                    &self.metadata_model,
                    vec![serde_json::json!({ "google_search": {} })],
                ),
            };
            let req = Req {
                contents: vec![Content {
                    parts: vec![Part { text: prompt }],
                }],
                tools,
            };

            let resp = match self
                .http
                .post(format!("{GEMINI_BASE}/{model}:generateContent"))
                .header("x-goog-api-key", &self.api_key)
                .json(&req)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    warn!(target: "assist", error = %e, "gemini request failed");
                    return None;
                }
            };

            if !resp.status().is_success() {
                warn!(target: "assist", status = %resp.status(), "gemini returned error status");
                return None;
            }
            let body: Resp = resp.json().await.ok()?;
            let text = body
                .candidates
                .first()
                .map(|c| {
                    c.content
                        .parts
                        .iter()
                        .map(|p| p.text.as_str())
                        .collect::<String>()
                })
                .unwrap_or_default();
            if text.trim().is_empty() {
                None
            } else {
                Some(text)
            }
        })
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

/// Returns `None` always; used when assist is disabled.
pub struct DisabledClient;

impl AssistClient for DisabledClient {
    fn outline<'a>(&'a self, _card: &'a VideoCard) -> BoxFuture<'a, Option<String>> {
        Box::pin(async { None })
    }
    fn video_metadata<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, Option<VideoMeta>> {
        Box::pin(async { None })
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Fixed replies for tests/local runs.
#[derive(Debug, Clone)]
pub struct MockProvider {
    pub outline: String,
    pub metadata: String,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            outline: "**Hook:** Open on the strongest view.\n1. Point one\n2. Point two\n3. Point three\n4. Point four\n**CTA:** Book a tour.".to_string(),
            metadata: r#"Here you go: {"title": "Mock video", "thumbnail": "https://img.example/mock.jpg"}"#.to_string(),
        }
    }
}

impl Provider for MockProvider {
    fn generate<'a>(&'a self, task: Task, _prompt: &'a str) -> BoxFuture<'a, Option<String>> {
        let out = match task {
            Task::Outline => self.outline.clone(),
            Task::Metadata => self.metadata.clone(),
        };
        Box::pin(async move { Some(out) })
    }
    fn name(&self) -> &'static str {
        "mock"
    }
}

// ------------------------------------------------------------
// Caching client wrapper (memory cache + daily limit)
// ------------------------------------------------------------

#[derive(Debug, Default)]
struct LimitState {
    day: Option<NaiveDate>,
    /// Successful remote calls today.
    count: u32,
    /// Remote calls in flight; they hold budget until they finish.
    pending: u32,
    cache: HashMap<String, String>,
}

/// A reserved budget slot. Dropping it releases the slot, including when the
/// request future is cancelled mid-call.
struct Reservation<'a> {
    state: &'a Mutex<LimitState>,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if let Ok(mut g) = self.state.lock() {
            g.pending = g.pending.saturating_sub(1);
        }
    }
}

pub struct LimitedClient<P: Provider> {
    inner: P,
    daily_limit: u32,
    clock: Arc<dyn Clock>,
    state: Mutex<LimitState>,
}

impl<P: Provider> LimitedClient<P> {
    pub fn new(inner: P, daily_limit: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner,
            daily_limit,
            clock,
            state: Mutex::new(LimitState::default()),
        }
    }

    /// Cache hit, or a real call if today's budget allows.
    async fn generate_cached(&self, task: Task, prompt: &str) -> Option<String> {
        let key = anon_hash(prompt);
        let reservation = {
            let mut g = self.state.lock().ok()?;
            if let Some(hit) = g.cache.get(&key) {
                return Some(hit.clone());
            }
            let today = self.clock.now().date_naive();
            if g.day != Some(today) {
                g.day = Some(today);
                g.count = 0;
            }
            if g.count.saturating_add(g.pending) >= self.daily_limit {
                warn!(target: "assist", limit = self.daily_limit, "daily assist limit reached");
                return None;
            }
            g.pending += 1;
            Reservation { state: &self.state }
        };

        let fresh = self.inner.generate(task, prompt).await;
        let fresh = fresh
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let mut g = self.state.lock().ok()?;
        if let Some(text) = &fresh {
            // Count only successful real calls.
            g.count = g.count.saturating_add(1);
            g.cache.insert(key, text.clone());
        }
        drop(g);
        drop(reservation);
        fresh
    }
}

impl<P: Provider> AssistClient for LimitedClient<P> {
    fn outline<'a>(&'a self, card: &'a VideoCard) -> BoxFuture<'a, Option<String>> {
        Box::pin(async move {
            let prompt = outline_prompt(card);
            self.generate_cached(Task::Outline, &prompt).await
        })
    }

    fn video_metadata<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Option<VideoMeta>> {
        Box::pin(async move {
            if !is_youtube_url(url) {
                return None;
            }
            let prompt = metadata_prompt(url);
            let reply = self.generate_cached(Task::Metadata, &prompt).await?;
            parse_video_meta(&reply)
        })
    }

    fn provider_name(&self) -> &'static str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_is_pulled_out_of_chatter() {
        let reply = "Sure!\n```json\n{\"title\": \"Living in Apex\", \"thumbnail\": \"https://i.ytimg.com/x.jpg\"}\n```";
        let meta = parse_video_meta(reply).unwrap();
        assert_eq!(meta.title, "Living in Apex");
        assert_eq!(meta.thumbnail.as_deref(), Some("https://i.ytimg.com/x.jpg"));
        assert!(parse_video_meta("no json here").is_none());
        assert!(parse_video_meta("{\"title\": \"\"}").is_none());
    }

    #[test]
    fn outline_goes_under_header() {
        assert_eq!(append_outline("", "body"), "### AI SCRIPT STRATEGY\nbody");
        assert_eq!(
            append_outline("my notes", "body"),
            "my notes\n\n### AI SCRIPT STRATEGY\nbody"
        );
    }

    #[test]
    fn youtube_detection() {
        assert!(is_youtube_url("https://www.youtube.com/watch?v=abc"));
        assert!(is_youtube_url("https://youtu.be/abc"));
        assert!(!is_youtube_url("https://vimeo.com/123"));
    }
}
