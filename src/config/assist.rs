// src/config/assist.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_outline_model() -> String {
    "gemini-2.5-pro".to_string()
}
fn default_metadata_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_daily_limit() -> u32 {
    50
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistConfig {
    pub enabled: bool,
    /// "gemini" | "mock" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_outline_model")]
    pub outline_model: String,
    #[serde(default = "default_metadata_model")]
    pub metadata_model: String,
    /// "ENV" means: read from GEMINI_API_KEY
    #[serde(default)]
    pub api_key: String,
    /// Remote calls per day; cache hits do not count.
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_provider(),
            outline_model: default_outline_model(),
            metadata_model: default_metadata_model(),
            api_key: String::new(),
            daily_limit: default_daily_limit(),
        }
    }
}

impl AssistConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    /// Missing file means assist is disabled.
    pub fn load_or_disabled<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        if !path.as_ref().exists() {
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }

    pub fn from_json_str(data: &str) -> anyhow::Result<Self> {
        let mut cfg: AssistConfig = serde_json::from_str(data)?;

        cfg.provider = cfg.provider.trim().to_lowercase();
        match cfg.provider.as_str() {
            "gemini" | "mock" => {}
            other => anyhow::bail!("Unsupported assist provider in config: {other}"),
        }

        // Resolve api key if "ENV"
        if cfg.enabled && cfg.provider == "gemini" && cfg.api_key.trim().eq_ignore_ascii_case("env")
        {
            cfg.api_key = env::var("GEMINI_API_KEY")
                .map_err(|_| anyhow::anyhow!("Missing GEMINI_API_KEY env var"))?;
        }

        Ok(cfg)
    }
}
