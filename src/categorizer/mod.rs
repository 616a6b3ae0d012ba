// src/categorizer/mod.rs
//! Idea categorizer: free-form idea text in, new backlog card out.
//!
//! Order:
//! 1) Neighborhood guess from the original-case text (`location`)
//! 2) Stage / format / runtime from the lowercased text (`rules`)
//! 3) Card assembly with fresh id + timestamp from the injected sources
//!
//! The function is total: empty or odd input falls through to an empty
//! neighborhood and the TOF default.

pub mod location;
pub mod rules;

use metrics::counter;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::card::{FunnelStage, InspirationLink, VideoCard, WorkflowStage, INSPIRATION_SLOTS};
use crate::catalog::FunnelCatalog;
use crate::clock::{Clock, SystemClock};
use crate::ids::{IdSource, UuidSource};
use crate::logging::anon_hash;

pub use location::extract_neighborhood;
pub use rules::{decide, Decision, Rule};

static DEFAULT: Lazy<Categorizer> = Lazy::new(Categorizer::default);

/// The text-derived part of a categorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub stage: FunnelStage,
    pub format: String,
    pub runtime_minutes: u32,
    pub neighborhood: String,
    pub rule: Rule,
}

/// Owns an immutable catalog plus the id/clock sources used for new cards.
/// Cheap to clone and safe to share across threads.
#[derive(Clone)]
pub struct Categorizer {
    catalog: Arc<FunnelCatalog>,
    ids: Arc<dyn IdSource>,
    clock: Arc<dyn Clock>,
}

impl Default for Categorizer {
    fn default() -> Self {
        Self::new(FunnelCatalog::embedded())
    }
}

impl Categorizer {
    pub fn new(catalog: FunnelCatalog) -> Self {
        Self::with_sources(catalog, Arc::new(UuidSource), Arc::new(SystemClock))
    }

    pub fn with_sources(
        catalog: FunnelCatalog,
        ids: Arc<dyn IdSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            ids,
            clock,
        }
    }

    pub fn catalog(&self) -> &FunnelCatalog {
        &self.catalog
    }

    /// Text-only half of the categorization; deterministic for a given catalog.
    pub fn classify(&self, text: &str) -> Classification {
        let neighborhood = extract_neighborhood(text);
        let lower = text.to_lowercase();
        let Decision {
            stage,
            format,
            runtime_minutes,
            rule,
        } = decide(&lower, &self.catalog);

        Classification {
            stage,
            format,
            runtime_minutes,
            neighborhood,
            rule,
        }
    }

    /// Build a fresh backlog card for `text`.
    pub fn categorize(&self, text: &str) -> VideoCard {
        self.categorize_explained(text).0
    }

    /// Like `categorize`, also returning the rule that decided stage and format.
    pub fn categorize_explained(&self, text: &str) -> (VideoCard, Rule) {
        let c = self.classify(text);

        counter!("ideas_categorized_total", "stage" => c.stage.as_str(), "rule" => c.rule.as_str())
            .increment(1);
        // Never log raw text. Only hashed id + outcome.
        debug!(
            target: "categorizer",
            id = %anon_hash(text),
            stage = %c.stage,
            format = %c.format,
            rule = c.rule.as_str(),
            has_neighborhood = !c.neighborhood.is_empty(),
            "idea categorized"
        );

        let card = VideoCard {
            id: self.ids.next_id(),
            title: text.to_string(),
            funnel_stage: c.stage,
            format_type: c.format,
            target_runtime: c.runtime_minutes,
            status: WorkflowStage::INITIAL,
            notes: String::new(),
            location: None,
            neighborhood: Some(c.neighborhood),
            created_date: self.clock.now(),
            target_shoot_date: None,
            target_publish_date: None,
            target_publish_time: None,
            actual_publish_date: None,
            deleted_date: None,
            original_status: None,
            youtube_link: None,
            inspiration_links: vec![InspirationLink::empty(); INSPIRATION_SLOTS],
            external_docs: Vec::new(),
            is_archived: false,
            is_trashed: false,
        };
        (card, c.rule)
    }
}

/// Categorize with the embedded catalog, random ids and the wall clock.
pub fn categorize_idea(text: &str) -> VideoCard {
    DEFAULT.categorize(text)
}
