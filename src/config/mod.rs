// src/config/mod.rs
//! Service configuration resolved from the environment (after `.env` is loaded).

pub mod assist;

use std::path::PathBuf;

pub const ENV_BOARD_PATH: &str = "FUNNEL_BOARD_PATH";
pub const ENV_ASSIST_CONFIG_PATH: &str = "FUNNEL_ASSIST_CONFIG_PATH";
pub const ENV_METRICS: &str = "FUNNEL_METRICS";

pub const DEFAULT_ASSIST_CONFIG_PATH: &str = "config/assist.json";

#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// Board snapshot file. `None` keeps the board in memory only.
    pub board_path: Option<PathBuf>,
    pub assist_config_path: PathBuf,
    /// Mount `/metrics` (Prometheus exposition).
    pub metrics: bool,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        let board_path = std::env::var(ENV_BOARD_PATH)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        let assist_config_path = std::env::var(ENV_ASSIST_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_ASSIST_CONFIG_PATH));
        let metrics = std::env::var(ENV_METRICS)
            .ok()
            .is_some_and(|v| v == "1");
        Self {
            board_path,
            assist_config_path,
            metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn env_overrides_and_defaults() {
        std::env::remove_var(ENV_BOARD_PATH);
        std::env::remove_var(ENV_ASSIST_CONFIG_PATH);
        std::env::remove_var(ENV_METRICS);
        let cfg = ServiceConfig::from_env();
        assert!(cfg.board_path.is_none());
        assert_eq!(cfg.assist_config_path, PathBuf::from(DEFAULT_ASSIST_CONFIG_PATH));
        assert!(!cfg.metrics);

        std::env::set_var(ENV_BOARD_PATH, "data/board.json");
        std::env::set_var(ENV_METRICS, "1");
        let cfg = ServiceConfig::from_env();
        assert_eq!(cfg.board_path, Some(PathBuf::from("data/board.json")));
        assert!(cfg.metrics);

        std::env::remove_var(ENV_BOARD_PATH);
        std::env::remove_var(ENV_METRICS);
    }
}
