// src/catalog.rs
//! Funnel catalog: the fixed table of formats and intake keywords per funnel stage.
//!
//! The default table is embedded from `config/catalog.toml`. A different table can be
//! loaded at startup (`FUNNEL_CATALOG_PATH`), but it is immutable once built and is
//! owned by the categorizer that uses it.

use anyhow::{anyhow, bail, Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::card::FunnelStage;
use crate::categorizer::rules::FIXED_FORMATS;

pub const DEFAULT_CATALOG_PATH: &str = "config/catalog.toml";
pub const ENV_CATALOG_PATH: &str = "FUNNEL_CATALOG_PATH";

static EMBEDDED: Lazy<FunnelCatalog> = Lazy::new(|| {
    let raw = include_str!("../config/catalog.toml");
    FunnelCatalog::from_toml_str(raw).expect("valid embedded funnel catalog")
});

/// One funnel stage's entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunnelConfig {
    pub label: String,
    pub name: String,
    /// Ordered; the first entry is the keyword-fallback format.
    pub formats: Vec<String>,
    /// Lowercase phrases matched as plain substrings.
    pub keywords: Vec<String>,
    /// Typical runtime in minutes, `[min, max]`.
    pub runtime_range: [u32; 2],
}

impl FunnelConfig {
    pub fn primary_format(&self) -> &str {
        self.formats.first().map(String::as_str).unwrap_or_default()
    }

    pub fn has_format(&self, format: &str) -> bool {
        self.formats.iter().any(|f| f == format)
    }

    /// `lower_text` must already be lowercased.
    pub fn matches_keyword(&self, lower_text: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| lower_text.contains(k.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunnelCatalog {
    #[serde(rename = "TOF")]
    tof: FunnelConfig,
    #[serde(rename = "MOF")]
    mof: FunnelConfig,
    #[serde(rename = "BOF")]
    bof: FunnelConfig,
}

impl Default for FunnelCatalog {
    fn default() -> Self {
        Self::embedded()
    }
}

impl FunnelCatalog {
    /// The table shipped with the crate.
    pub fn embedded() -> Self {
        EMBEDDED.clone()
    }

    /// Resolve the catalog path:
    /// 1) $FUNNEL_CATALOG_PATH (must exist)
    /// 2) config/catalog.toml
    /// 3) embedded default
    pub fn load() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CATALOG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CATALOG_PATH} points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        let default = PathBuf::from(DEFAULT_CATALOG_PATH);
        if default.exists() {
            return Self::load_from(&default);
        }
        Ok(Self::embedded())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading funnel catalog from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing funnel catalog {}", path.display()))
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let cat: FunnelCatalog = toml::from_str(toml_str)?;
        cat.validate()?;
        Ok(cat)
    }

    pub fn get(&self, stage: FunnelStage) -> &FunnelConfig {
        match stage {
            FunnelStage::Tof => &self.tof,
            FunnelStage::Mof => &self.mof,
            FunnelStage::Bof => &self.bof,
        }
    }

    pub fn contains(&self, stage: FunnelStage, format: &str) -> bool {
        self.get(stage).has_format(format)
    }

    /// First stage (TOF, MOF, BOF order) whose catalog lists `format`.
    pub fn stage_for_format(&self, format: &str) -> Option<FunnelStage> {
        FunnelStage::ALL
            .into_iter()
            .find(|s| self.get(*s).has_format(format))
    }

    fn validate(&self) -> Result<()> {
        for stage in FunnelStage::ALL {
            let cfg = self.get(stage);
            if cfg.formats.is_empty() {
                bail!("stage {stage} lists no formats");
            }
            let [min, max] = cfg.runtime_range;
            if min == 0 || min > max {
                bail!("stage {stage} has invalid runtime_range [{min}, {max}]");
            }
            if cfg.keywords.iter().any(|k| k.to_lowercase() != *k) {
                bail!("stage {stage} keywords must be lowercase");
            }
        }
        for (stage, format) in FIXED_FORMATS {
            if !self.contains(stage, format) {
                bail!("stage {stage} must list the `{format}` format");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_is_valid() {
        let cat = FunnelCatalog::embedded();
        assert_eq!(cat.get(FunnelStage::Tof).primary_format(), "Pros & Cons");
        assert_eq!(cat.get(FunnelStage::Mof).primary_format(), "Map Tours");
        assert_eq!(
            cat.get(FunnelStage::Bof).primary_format(),
            "New Construction Tour"
        );
        assert_eq!(cat.get(FunnelStage::Mof).runtime_range, [20, 35]);
    }

    #[test]
    fn stage_lookup_by_format() {
        let cat = FunnelCatalog::embedded();
        assert_eq!(cat.stage_for_format("City vs City"), Some(FunnelStage::Mof));
        assert_eq!(cat.stage_for_format("Area Spotlight"), Some(FunnelStage::Bof));
        assert_eq!(cat.stage_for_format("Custom"), None);
    }

    #[test]
    fn keyword_match_is_substring() {
        let cat = FunnelCatalog::embedded();
        assert!(cat.get(FunnelStage::Tof).matches_keyword("why people are moving to cary"));
        assert!(cat.get(FunnelStage::Bof).matches_keyword("the buying process"));
        assert!(!cat.get(FunnelStage::Bof).matches_keyword("a quiet street"));
    }

    #[test]
    fn rejects_catalog_missing_rule_format() {
        let raw = include_str!("../config/catalog.toml").replace("\"Map Tours\", ", "");
        let err = FunnelCatalog::from_toml_str(&raw).unwrap_err();
        assert!(err.to_string().contains("Map Tours"), "{err}");
    }

    #[test]
    fn rejects_empty_formats() {
        let raw = r#"
[TOF]
label = "TOF"
name = "Top"
formats = []
keywords = []
runtime_range = [18, 25]

[MOF]
label = "MOF"
name = "Middle"
formats = ["Map Tours", "City Tours", "Neighborhood Tours"]
keywords = []
runtime_range = [20, 35]

[BOF]
label = "BOF"
name = "Bottom"
formats = ["New Construction Tour", "Builder Community Tour"]
keywords = []
runtime_range = [30, 60]
"#;
        let err = FunnelCatalog::from_toml_str(raw).unwrap_err();
        assert!(err.to_string().contains("no formats"), "{err}");
    }
}
