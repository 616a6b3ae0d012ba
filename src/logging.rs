// src/logging.rs
//! Dev-only tracing setup and log anonymization helpers.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_DEV_LOG: &str = "FUNNEL_DEV_LOG";

fn is_dev_env() -> bool {
    cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        )
}

/// FUNNEL_DEV_LOG=1 AND dev env (debug build or SHUTTLE_ENV in {local,development,dev}).
pub fn dev_logging_enabled() -> bool {
    let on = std::env::var(ENV_DEV_LOG).ok().as_deref() == Some("1");
    on && is_dev_env()
}

/// Install a compact fmt subscriber when dev logging is enabled. No-op otherwise,
/// and safe to call more than once.
pub fn init_dev_tracing() {
    if !dev_logging_enabled() {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("categorizer=debug,board=info,assist=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

/// Short SHA-256 prefix of `text`. Idea text is never logged raw.
pub fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anon_hash_is_short_and_stable() {
        let a = anon_hash("Touring The Preserve in Wake Forest");
        assert_eq!(a.len(), 12);
        assert_eq!(a, anon_hash("Touring The Preserve in Wake Forest"));
        assert_ne!(a, anon_hash("touring the preserve in wake forest"));
    }
}
