// src/card.rs
//! Card data model shared by the categorizer, the board and the HTTP API.
//!
//! JSON field names are camelCase so board snapshots stay readable by the
//! browser front-end that produced the original format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Marketing-funnel position of a planned video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FunnelStage {
    Tof,
    Mof,
    Bof,
}

impl FunnelStage {
    pub const ALL: [FunnelStage; 3] = [FunnelStage::Tof, FunnelStage::Mof, FunnelStage::Bof];

    pub fn as_str(&self) -> &'static str {
        match self {
            FunnelStage::Tof => "TOF",
            FunnelStage::Mof => "MOF",
            FunnelStage::Bof => "BOF",
        }
    }
}

impl fmt::Display for FunnelStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FunnelStage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TOF" => Ok(FunnelStage::Tof),
            "MOF" => Ok(FunnelStage::Mof),
            "BOF" => Ok(FunnelStage::Bof),
            other => anyhow::bail!("unknown funnel stage: {other}"),
        }
    }
}

/// Production pipeline column, in board order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowStage {
    #[serde(rename = "Idea Backlog")]
    IdeaBacklog,
    #[serde(rename = "Currently in Scripting")]
    CurrentlyInScripting,
    #[serde(rename = "Scheduled to be Filmed")]
    ScheduledToBeFilmed,
    #[serde(rename = "Needs Packaging")]
    NeedsPackaging,
    #[serde(rename = "In Editing")]
    InEditing,
    #[serde(rename = "Scheduled to be Published")]
    ScheduledToBePublished,
    #[serde(rename = "Published & Analytics Review")]
    PublishedAnalyticsReview,
}

impl WorkflowStage {
    pub const ALL: [WorkflowStage; 7] = [
        WorkflowStage::IdeaBacklog,
        WorkflowStage::CurrentlyInScripting,
        WorkflowStage::ScheduledToBeFilmed,
        WorkflowStage::NeedsPackaging,
        WorkflowStage::InEditing,
        WorkflowStage::ScheduledToBePublished,
        WorkflowStage::PublishedAnalyticsReview,
    ];

    /// Column every new idea lands in.
    pub const INITIAL: WorkflowStage = WorkflowStage::IdeaBacklog;
    /// Reaching this column archives the card.
    pub const FINAL: WorkflowStage = WorkflowStage::PublishedAnalyticsReview;

    pub fn label(&self) -> &'static str {
        match self {
            WorkflowStage::IdeaBacklog => "Idea Backlog",
            WorkflowStage::CurrentlyInScripting => "Currently in Scripting",
            WorkflowStage::ScheduledToBeFilmed => "Scheduled to be Filmed",
            WorkflowStage::NeedsPackaging => "Needs Packaging",
            WorkflowStage::InEditing => "In Editing",
            WorkflowStage::ScheduledToBePublished => "Scheduled to be Published",
            WorkflowStage::PublishedAnalyticsReview => "Published & Analytics Review",
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspirationLink {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl InspirationLink {
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocKind {
    Pdf,
    Doc,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalDoc {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: DocKind,
}

/// Number of inspiration slots a fresh card carries.
pub const INSPIRATION_SLOTS: usize = 3;

/// A planned video on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCard {
    pub id: String,
    pub title: String,
    pub funnel_stage: FunnelStage,
    pub format_type: String,
    /// Minutes.
    pub target_runtime: u32,
    pub status: WorkflowStage,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    pub created_date: DateTime<Utc>,
    /// `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_shoot_date: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_publish_date: Option<String>,
    /// `HH:MM`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_publish_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_publish_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_status: Option<WorkflowStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_link: Option<String>,
    #[serde(default)]
    pub inspiration_links: Vec<InspirationLink>,
    #[serde(default)]
    pub external_docs: Vec<ExternalDoc>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_trashed: bool,
}

impl VideoCard {
    /// Status to return to after an archive/trash is undone.
    pub fn restore_status(&self) -> WorkflowStage {
        self.original_status.unwrap_or(WorkflowStage::INITIAL)
    }

    /// Case-insensitive search over title and neighborhood.
    pub fn matches_query(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        if q.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&q)
            || self
                .neighborhood
                .as_deref()
                .unwrap_or_default()
                .to_lowercase()
                .contains(&q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_use_display_labels_on_the_wire() {
        let json = serde_json::to_string(&WorkflowStage::PublishedAnalyticsReview).unwrap();
        assert_eq!(json, "\"Published & Analytics Review\"");
        let back: WorkflowStage = serde_json::from_str("\"Needs Packaging\"").unwrap();
        assert_eq!(back, WorkflowStage::NeedsPackaging);
        assert_eq!(serde_json::to_string(&FunnelStage::Mof).unwrap(), "\"MOF\"");
    }

    #[test]
    fn funnel_stage_parses_case_insensitively() {
        assert_eq!("bof".parse::<FunnelStage>().unwrap(), FunnelStage::Bof);
        assert!("middle".parse::<FunnelStage>().is_err());
    }

    #[test]
    fn card_reads_snapshot_without_optional_fields() {
        let raw = r#"{
            "id": "a1",
            "title": "Why Raleigh is Booming",
            "funnelStage": "TOF",
            "formatType": "Pros & Cons",
            "targetRuntime": 22,
            "status": "Idea Backlog",
            "notes": "",
            "neighborhood": "Raleigh, NC",
            "createdDate": "2025-01-10T12:00:00Z",
            "inspirationLinks": [{ "url": "" }],
            "externalDocs": [{ "name": "brief", "url": "https://x", "type": "pdf" }],
            "isArchived": false
        }"#;
        let card: VideoCard = serde_json::from_str(raw).unwrap();
        assert!(!card.is_trashed);
        assert_eq!(card.external_docs[0].kind, DocKind::Pdf);
        assert!(card.matches_query("raleigh"));
        assert!(card.matches_query("BOOMING"));
        assert!(!card.matches_query("durham"));
    }
}
