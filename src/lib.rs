// src/lib.rs
// Public library surface for integration tests and the service binary.

pub mod api;
pub mod assist;
pub mod board;
pub mod card;
pub mod catalog;
pub mod categorizer;
pub mod clock;
pub mod config;
pub mod ids;
pub mod intake;
pub mod logging;
pub mod metrics;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::card::{FunnelStage, VideoCard, WorkflowStage};
pub use crate::catalog::FunnelCatalog;
pub use crate::categorizer::{categorize_idea, Categorizer, Classification, Rule};

/// Full application router: API routes plus `/metrics` when `FUNNEL_METRICS=1`.
pub fn app(state: AppState) -> anyhow::Result<axum::Router> {
    let cfg = config::ServiceConfig::from_env();
    let mut app = router(state);
    if cfg.metrics {
        let m = crate::metrics::Metrics::init()?;
        app = app.merge(m.router());
    }
    Ok(app)
}
