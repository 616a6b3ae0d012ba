// src/api.rs
//! HTTP surface: categorize ideas, manage the board, call the AI assist.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use metrics::counter;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::assist::{self, DynAssist, VideoMeta};
use crate::board::{Board, ScheduleKind, View};
use crate::card::{FunnelStage, InspirationLink, VideoCard, WorkflowStage, INSPIRATION_SLOTS};
use crate::catalog::FunnelCatalog;
use crate::categorizer::{Categorizer, Rule};
use crate::clock::{Clock, SystemClock};
use crate::config::{assist::AssistConfig, ServiceConfig};
use crate::ids::UuidSource;
use crate::intake::{self, IntakeRequest};

type ApiResult<T> = Result<T, (StatusCode, String)>;

#[derive(Clone)]
pub struct AppState {
    pub categorizer: Categorizer,
    pub board: Board,
    pub assist: DynAssist,
    pub board_path: Option<Arc<PathBuf>>,
}

impl AppState {
    /// Build everything from env/config files: catalog, board snapshot, assist client.
    pub fn from_env() -> Result<Self> {
        let cfg = ServiceConfig::from_env();
        let catalog = FunnelCatalog::load()?;
        let categorizer = Categorizer::new(catalog);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let board = match &cfg.board_path {
            Some(p) => Board::load_json(p, clock, &UuidSource)?,
            None => Board::new(clock),
        };
        let assist_cfg = AssistConfig::load_or_disabled(&cfg.assist_config_path)?;
        Ok(Self {
            categorizer,
            board,
            assist: assist::build_client(&assist_cfg),
            board_path: cfg.board_path.map(Arc::new),
        })
    }

    fn persist(&self, op: &'static str) {
        counter!("board_mutations_total", "op" => op).increment(1);
        self.board.persist(self.board_path.as_deref().map(PathBuf::as_path));
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/catalog", get(get_catalog))
        .route("/categorize", post(categorize))
        .route("/ideas", post(submit_ideas))
        .route("/cards", get(list_cards))
        .route("/cards/{id}", put(update_card).delete(delete_card))
        .route("/cards/{id}/move", post(move_card))
        .route("/cards/{id}/archive", post(archive_card))
        .route("/cards/{id}/unarchive", post(unarchive_card))
        .route("/cards/{id}/trash", post(trash_card))
        .route("/cards/{id}/restore", post(restore_card))
        .route("/cards/{id}/undo", post(undo_card))
        .route("/cards/{id}/reschedule", post(reschedule_card))
        .route("/cards/{id}/outline", post(outline_card))
        .route("/cards/{id}/inspiration", post(set_inspiration))
        .route("/assist/video-meta", post(video_meta))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

fn not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "card not found".to_string())
}

async fn get_catalog(State(state): State<AppState>) -> Json<FunnelCatalog> {
    Json(state.categorizer.catalog().clone())
}

#[derive(Deserialize)]
struct CategorizeReq {
    text: String,
}

#[derive(Serialize)]
struct CategorizeResp {
    card: VideoCard,
    rule: Rule,
}

async fn categorize(
    State(state): State<AppState>,
    Json(body): Json<CategorizeReq>,
) -> Json<CategorizeResp> {
    let (card, rule) = state.categorizer.categorize_explained(&body.text);
    Json(CategorizeResp { card, rule })
}

async fn submit_ideas(
    State(state): State<AppState>,
    Json(body): Json<IntakeRequest>,
) -> (StatusCode, Json<Vec<VideoCard>>) {
    let cards = intake::intake(&state.categorizer, &body);
    if !cards.is_empty() {
        state.board.add_cards(cards.clone());
        state.persist("add");
    }
    (StatusCode::CREATED, Json(cards))
}

#[derive(Deserialize)]
struct CardsQuery {
    #[serde(default)]
    view: View,
    #[serde(default)]
    q: String,
    #[serde(default)]
    funnel: Option<FunnelStage>,
}

async fn list_cards(
    State(state): State<AppState>,
    Query(q): Query<CardsQuery>,
) -> Json<Vec<VideoCard>> {
    Json(state.board.view(q.view, &q.q, q.funnel))
}

async fn update_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut card): Json<VideoCard>,
) -> ApiResult<Json<VideoCard>> {
    card.id = id;
    if !state.board.update(card.clone()) {
        return Err(not_found());
    }
    state.persist("update");
    Ok(Json(card))
}

async fn delete_card(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    if state.board.delete_permanently(&id) {
        state.persist("delete");
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

#[derive(Deserialize)]
struct MoveReq {
    status: WorkflowStage,
}

async fn move_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<MoveReq>,
) -> ApiResult<Json<VideoCard>> {
    let card = state.board.move_card(&id, body.status).ok_or_else(not_found)?;
    state.persist("move");
    Ok(Json(card))
}

async fn archive_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<VideoCard>> {
    let card = state.board.archive(&id).ok_or_else(not_found)?;
    state.persist("archive");
    Ok(Json(card))
}

async fn unarchive_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<VideoCard>> {
    let card = state.board.unarchive(&id).ok_or_else(not_found)?;
    state.persist("unarchive");
    Ok(Json(card))
}

async fn trash_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<VideoCard>> {
    let card = state.board.trash(&id).ok_or_else(not_found)?;
    state.persist("trash");
    Ok(Json(card))
}

async fn restore_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<VideoCard>> {
    let card = state.board.restore(&id).ok_or_else(not_found)?;
    state.persist("restore");
    Ok(Json(card))
}

async fn undo_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<VideoCard>> {
    let card = state.board.undo(&id).ok_or_else(not_found)?;
    state.persist("undo");
    Ok(Json(card))
}

#[derive(Deserialize)]
struct RescheduleReq {
    date: String,
    kind: ScheduleKind,
}

async fn reschedule_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<RescheduleReq>,
) -> ApiResult<Json<VideoCard>> {
    if NaiveDate::parse_from_str(&body.date, "%Y-%m-%d").is_err() {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("date must be YYYY-MM-DD, got '{}'", body.date),
        ));
    }
    let card = state
        .board
        .reschedule(&id, &body.date, body.kind)
        .ok_or_else(not_found)?;
    state.persist("reschedule");
    Ok(Json(card))
}

async fn outline_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<VideoCard>> {
    let card = state.board.get(&id).ok_or_else(not_found)?;
    let outline = state.assist.outline(&card).await.ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("assist '{}' produced no outline", state.assist.provider_name()),
        )
    })?;
    // The card may have moved while the outline was generated; touch only its notes.
    let card = state
        .board
        .append_outline(&id, &outline)
        .ok_or_else(not_found)?;
    state.persist("outline");
    Ok(Json(card))
}

#[derive(Deserialize)]
struct InspirationReq {
    slot: usize,
    url: String,
}

async fn set_inspiration(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<InspirationReq>,
) -> ApiResult<Json<VideoCard>> {
    if body.slot >= INSPIRATION_SLOTS {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("slot must be below {INSPIRATION_SLOTS}, got {}", body.slot),
        ));
    }
    if state.board.get(&id).is_none() {
        return Err(not_found());
    }

    let url = body.url.trim().to_string();
    let mut link = InspirationLink {
        url: url.clone(),
        ..InspirationLink::empty()
    };
    if assist::is_youtube_url(&url) {
        if let Some(meta) = state.assist.video_metadata(&url).await {
            assist::apply_video_meta(&mut link, meta);
        }
    }

    let card = state
        .board
        .set_inspiration(&id, body.slot, link)
        .ok_or_else(not_found)?;
    state.persist("inspiration");
    Ok(Json(card))
}

#[derive(Deserialize)]
struct VideoMetaReq {
    url: String,
}

async fn video_meta(
    State(state): State<AppState>,
    Json(body): Json<VideoMetaReq>,
) -> Result<Json<VideoMeta>, StatusCode> {
    state
        .assist
        .video_metadata(&body.url)
        .await
        .map(Json)
        .ok_or(StatusCode::NO_CONTENT)
}
