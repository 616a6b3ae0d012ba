//! Video funnel planner binary entrypoint.
//! Boots the Axum HTTP server with the categorizer, board and assist wired into shared state.

use shuttle_axum::ShuttleAxum;
use tracing::info;

use video_funnel_planner::{app, logging, AppState};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    logging::init_dev_tracing();

    let state = AppState::from_env()?;
    info!(
        cards = state.board.len(),
        assist = state.assist.provider_name(),
        "video funnel planner starting"
    );
    let router = app(state)?;

    Ok(router.into())
}
