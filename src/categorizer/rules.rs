// src/categorizer/rules.rs
//! Ordered stage/format decision.
//!
//! Precedence (first hit wins, later rules are never consulted):
//! 1. new construction / builder / model home        -> BOF, 45 min
//! 2. tour or walkthrough wording, unless a map cue  -> MOF, 28 or 45 min
//! 3. map cue                                        -> MOF, 25 min
//! 4. catalog keywords: BOF, then MOF, else TOF       -> primary format, 22 min
//!
//! Rule 2 steps aside for a map cue but rule 3 never steps aside for tour
//! wording. Keep that asymmetry; reordering changes classifications.

use serde::Serialize;

use crate::card::FunnelStage;
use crate::catalog::FunnelCatalog;

pub const NEW_CONSTRUCTION_SIGNALS: &[&str] = &["new construction", "builder", "model home"];
pub const TOUR_SIGNALS: &[&str] = &[
    "walking",
    "driving",
    "we toured",
    "full tour",
    "touring",
    "toured",
];
pub const MAP_SIGNALS: &[&str] = &["map tour", "explained"];
pub const NEIGHBORHOOD_SIGNALS: &[&str] = &["neighborhood", "community", "preserve"];

pub const BUILDER_COMMUNITY_TOUR: &str = "Builder Community Tour";
pub const NEW_CONSTRUCTION_TOUR: &str = "New Construction Tour";
pub const NEIGHBORHOOD_TOURS: &str = "Neighborhood Tours";
pub const CITY_TOURS: &str = "City Tours";
pub const MAP_TOURS: &str = "Map Tours";

/// Formats the rules emit directly; every catalog must list them under these stages.
pub const FIXED_FORMATS: [(FunnelStage, &str); 5] = [
    (FunnelStage::Bof, BUILDER_COMMUNITY_TOUR),
    (FunnelStage::Bof, NEW_CONSTRUCTION_TOUR),
    (FunnelStage::Mof, NEIGHBORHOOD_TOURS),
    (FunnelStage::Mof, CITY_TOURS),
    (FunnelStage::Mof, MAP_TOURS),
];

pub const NEW_CONSTRUCTION_RUNTIME: u32 = 45;
pub const NEIGHBORHOOD_TOUR_RUNTIME: u32 = 28;
pub const CITY_TOUR_RUNTIME: u32 = 45;
pub const MAP_TOUR_RUNTIME: u32 = 25;
pub const DEFAULT_RUNTIME: u32 = 22;

/// Which predicate produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    NewConstruction,
    Tour,
    Map,
    KeywordBof,
    KeywordMof,
    DefaultTof,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::NewConstruction => "new_construction",
            Rule::Tour => "tour",
            Rule::Map => "map",
            Rule::KeywordBof => "keyword_bof",
            Rule::KeywordMof => "keyword_mof",
            Rule::DefaultTof => "default_tof",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub stage: FunnelStage,
    pub format: String,
    pub runtime_minutes: u32,
    pub rule: Rule,
}

fn any_of(lower: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| lower.contains(n))
}

/// `lower` must be the lowercased idea text.
pub fn decide(lower: &str, catalog: &FunnelCatalog) -> Decision {
    let is_tour = any_of(lower, TOUR_SIGNALS);
    let is_map = any_of(lower, MAP_SIGNALS);

    if any_of(lower, NEW_CONSTRUCTION_SIGNALS) {
        let format = if lower.contains("builder") {
            BUILDER_COMMUNITY_TOUR
        } else {
            NEW_CONSTRUCTION_TOUR
        };
        return Decision {
            stage: FunnelStage::Bof,
            format: format.to_string(),
            runtime_minutes: NEW_CONSTRUCTION_RUNTIME,
            rule: Rule::NewConstruction,
        };
    }

    if is_tour && !is_map {
        let (format, runtime) = if any_of(lower, NEIGHBORHOOD_SIGNALS) {
            (NEIGHBORHOOD_TOURS, NEIGHBORHOOD_TOUR_RUNTIME)
        } else {
            (CITY_TOURS, CITY_TOUR_RUNTIME)
        };
        return Decision {
            stage: FunnelStage::Mof,
            format: format.to_string(),
            runtime_minutes: runtime,
            rule: Rule::Tour,
        };
    }

    if is_map {
        return Decision {
            stage: FunnelStage::Mof,
            format: MAP_TOURS.to_string(),
            runtime_minutes: MAP_TOUR_RUNTIME,
            rule: Rule::Map,
        };
    }

    let (stage, rule) = if catalog.get(FunnelStage::Bof).matches_keyword(lower) {
        (FunnelStage::Bof, Rule::KeywordBof)
    } else if catalog.get(FunnelStage::Mof).matches_keyword(lower) {
        (FunnelStage::Mof, Rule::KeywordMof)
    } else {
        (FunnelStage::Tof, Rule::DefaultTof)
    };
    Decision {
        stage,
        format: catalog.get(stage).primary_format().to_string(),
        runtime_minutes: DEFAULT_RUNTIME,
        rule,
    }
}
