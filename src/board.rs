// src/board.rs
//! In-memory production board with archive/trash lifecycle and JSON snapshots.

use anyhow::{Context, Result};
use chrono::Duration;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{info, warn};

use crate::assist::append_outline;
use crate::card::{FunnelStage, InspirationLink, VideoCard, WorkflowStage, INSPIRATION_SLOTS};
use crate::clock::Clock;
use crate::ids::IdSource;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Board,
    Calendar,
    Archive,
    Trash,
}

impl View {
    fn admits(&self, card: &VideoCard) -> bool {
        match self {
            View::Trash => card.is_trashed,
            View::Archive => card.is_archived && !card.is_trashed,
            View::Board | View::Calendar => !card.is_trashed && !card.is_archived,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleKind {
    Shoot,
    Publish,
}

/// Shared handle; clones see the same cards.
#[derive(Clone)]
pub struct Board {
    cards: Arc<RwLock<Vec<VideoCard>>>,
    clock: Arc<dyn Clock>,
    /// Held from snapshot through rename so saves land in mutation order.
    save_lock: Arc<Mutex<()>>,
}

impl Board {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_cards(Vec::new(), clock)
    }

    pub fn with_cards(cards: Vec<VideoCard>, clock: Arc<dyn Clock>) -> Self {
        Self {
            cards: Arc::new(RwLock::new(cards)),
            clock,
            save_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn len(&self) -> usize {
        self.cards.read().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<VideoCard> {
        self.cards.read().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn get(&self, id: &str) -> Option<VideoCard> {
        let guard = self.cards.read().ok()?;
        guard.iter().find(|c| c.id == id).cloned()
    }

    pub fn add_cards(&self, new_cards: Vec<VideoCard>) {
        if let Ok(mut guard) = self.cards.write() {
            guard.extend(new_cards);
        }
    }

    /// Replace the stored card with the same id. Returns false for unknown ids.
    pub fn update(&self, card: VideoCard) -> bool {
        let Ok(mut guard) = self.cards.write() else {
            return false;
        };
        match guard.iter_mut().find(|c| c.id == card.id) {
            Some(slot) => {
                *slot = card;
                true
            }
            None => false,
        }
    }

    fn modify<F>(&self, id: &str, f: F) -> Option<VideoCard>
    where
        F: FnOnce(&mut VideoCard),
    {
        let mut guard = self.cards.write().ok()?;
        let card = guard.iter_mut().find(|c| c.id == id)?;
        f(card);
        Some(card.clone())
    }

    /// Move to another column. Landing in the final column archives the card.
    pub fn move_card(&self, id: &str, status: WorkflowStage) -> Option<VideoCard> {
        let now = self.clock.now();
        self.modify(id, |c| {
            let is_final = status == WorkflowStage::FINAL;
            c.original_status = Some(c.status);
            c.status = status;
            c.is_archived = is_final;
            if is_final {
                c.actual_publish_date = Some(now);
            }
        })
    }

    pub fn archive(&self, id: &str) -> Option<VideoCard> {
        let now = self.clock.now();
        let out = self.modify(id, |c| {
            c.original_status = Some(c.status);
            c.status = WorkflowStage::FINAL;
            c.is_archived = true;
            c.actual_publish_date = Some(now);
        });
        if out.is_some() {
            info!(target: "board", %id, "card archived");
        }
        out
    }

    pub fn unarchive(&self, id: &str) -> Option<VideoCard> {
        self.modify(id, |c| {
            c.is_archived = false;
            c.status = c.restore_status();
        })
    }

    pub fn trash(&self, id: &str) -> Option<VideoCard> {
        let now = self.clock.now();
        let out = self.modify(id, |c| {
            c.original_status = Some(c.status);
            c.is_trashed = true;
            c.deleted_date = Some(now);
        });
        if out.is_some() {
            info!(target: "board", %id, "card trashed");
        }
        out
    }

    pub fn restore(&self, id: &str) -> Option<VideoCard> {
        self.modify(id, |c| {
            c.is_trashed = false;
            c.deleted_date = None;
            c.status = c.restore_status();
        })
    }

    /// Revert the last archive or trash action on `id`.
    pub fn undo(&self, id: &str) -> Option<VideoCard> {
        self.modify(id, |c| {
            c.is_trashed = false;
            c.is_archived = false;
            c.deleted_date = None;
            c.status = c.restore_status();
        })
    }

    /// `date` is `YYYY-MM-DD`.
    pub fn reschedule(&self, id: &str, date: &str, kind: ScheduleKind) -> Option<VideoCard> {
        self.modify(id, |c| match kind {
            ScheduleKind::Shoot => c.target_shoot_date = Some(date.to_string()),
            ScheduleKind::Publish => c.target_publish_date = Some(date.to_string()),
        })
    }

    /// Append an AI outline to the live card's notes.
    pub fn append_outline(&self, id: &str, outline: &str) -> Option<VideoCard> {
        self.modify(id, |c| c.notes = append_outline(&c.notes, outline))
    }

    /// Replace one inspiration slot, padding older cards to the full slot count.
    /// Out-of-range slots leave the card untouched.
    pub fn set_inspiration(
        &self,
        id: &str,
        slot: usize,
        link: InspirationLink,
    ) -> Option<VideoCard> {
        self.modify(id, |c| {
            if slot >= INSPIRATION_SLOTS {
                return;
            }
            if c.inspiration_links.len() < INSPIRATION_SLOTS {
                c.inspiration_links.resize(INSPIRATION_SLOTS, InspirationLink::empty());
            }
            c.inspiration_links[slot] = link;
        })
    }

    pub fn delete_permanently(&self, id: &str) -> bool {
        let Ok(mut guard) = self.cards.write() else {
            return false;
        };
        let before = guard.len();
        guard.retain(|c| c.id != id);
        guard.len() != before
    }

    /// Search first (title or neighborhood), then the view partition, then the
    /// optional funnel filter.
    pub fn view(&self, view: View, query: &str, funnel: Option<FunnelStage>) -> Vec<VideoCard> {
        let Ok(guard) = self.cards.read() else {
            return Vec::new();
        };
        guard
            .iter()
            .filter(|c| c.matches_query(query))
            .filter(|c| view.admits(c))
            .filter(|c| funnel.map_or(true, |f| c.funnel_stage == f))
            .cloned()
            .collect()
    }

    /// Write the whole board as a JSON array (temp file + rename).
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let _guard = self
            .save_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("board save lock poisoned"))?;
        let cards = self.snapshot();
        let json = serde_json::to_string_pretty(&cards)?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating board directory {}", dir.display()))?;
        }
        let tmp = path.with_extension("json.tmp");
        let mut f = fs::File::create(&tmp)
            .with_context(|| format!("creating board snapshot {}", tmp.display()))?;
        f.write_all(json.as_bytes())?;
        fs::rename(&tmp, path)
            .with_context(|| format!("replacing board snapshot {}", path.display()))?;
        Ok(())
    }

    /// Load a snapshot. A missing file yields a board seeded with the template card.
    pub fn load_json(path: &Path, clock: Arc<dyn Clock>, ids: &dyn IdSource) -> Result<Self> {
        if !path.exists() {
            info!(target: "board", path = %path.display(), "no snapshot, seeding template");
            let seed = template_card(ids, clock.as_ref());
            return Ok(Self::with_cards(vec![seed], clock));
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading board snapshot {}", path.display()))?;
        let cards: Vec<VideoCard> = serde_json::from_str(&content)
            .with_context(|| format!("parsing board snapshot {}", path.display()))?;
        Ok(Self::with_cards(cards, clock))
    }

    /// Best-effort save used after mutations; failures are logged, not returned.
    pub fn persist(&self, path: Option<&Path>) {
        let Some(path) = path else {
            return;
        };
        if let Err(e) = self.save_json(path) {
            warn!(target: "board", error = ?e, "board snapshot not saved");
        }
    }
}

/// Welcome card for an empty board: shoot today, publish a week later.
pub fn template_card(ids: &dyn IdSource, clock: &dyn Clock) -> VideoCard {
    let now = clock.now();
    let today = now.date_naive();
    let next_week = today + Duration::days(7);
    VideoCard {
        id: ids.next_id(),
        title: "Template: Why Raleigh is Booming in 2025".to_string(),
        funnel_stage: FunnelStage::Tof,
        format_type: "Pros & Cons".to_string(),
        target_runtime: 22,
        status: WorkflowStage::INITIAL,
        notes: "Welcome! Add ideas one per line and they land in the backlog.".to_string(),
        location: None,
        neighborhood: Some("Raleigh, NC".to_string()),
        created_date: now,
        target_shoot_date: Some(today.format("%Y-%m-%d").to_string()),
        target_publish_date: Some(next_week.format("%Y-%m-%d").to_string()),
        target_publish_time: Some("10:00".to_string()),
        actual_publish_date: None,
        deleted_date: None,
        original_status: None,
        youtube_link: None,
        inspiration_links: vec![InspirationLink::empty(); INSPIRATION_SLOTS],
        external_docs: Vec::new(),
        is_archived: false,
        is_trashed: false,
    }
}
