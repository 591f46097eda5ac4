use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::event::{Category, FeedEvent, UnknownCategory};
use crate::runtime::{FeedHandle, SessionClosed, ToggleOutcome};
use crate::session::FeedSnapshot;

/// Read/command surface over one feed session.
pub fn create_router(feed: FeedHandle) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/feed", get(feed_snapshot))
        .route("/feed/history", get(feed_history))
        .route("/feed/latest", get(feed_latest))
        .route("/feed/latest/{category}", get(feed_latest_by_category))
        .route("/feed/toggle", post(feed_toggle))
        .route("/feed/reset", post(feed_reset))
        .layer(CorsLayer::very_permissive())
        .with_state(feed)
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategory),
    #[error(transparent)]
    SessionClosed(#[from] SessionClosed),
}

#[derive(serde::Serialize)]
struct ErrorOut {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::UnknownCategory(_) => StatusCode::BAD_REQUEST,
            ApiError::SessionClosed(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = Json(ErrorOut {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

async fn feed_snapshot(State(feed): State<FeedHandle>) -> Json<FeedSnapshot> {
    Json(feed.snapshot())
}

async fn feed_history(State(feed): State<FeedHandle>) -> Json<Vec<FeedEvent>> {
    Json(feed.snapshot().history)
}

async fn feed_latest(State(feed): State<FeedHandle>) -> Json<Option<FeedEvent>> {
    Json(feed.snapshot().latest)
}

async fn feed_latest_by_category(
    State(feed): State<FeedHandle>,
    Path(raw): Path<String>,
) -> Result<Json<Option<FeedEvent>>, ApiError> {
    let category: Category = raw.parse()?;
    let snap = feed.snapshot();
    Ok(Json(snap.latest_by_category.get(category).cloned()))
}

async fn feed_toggle(State(feed): State<FeedHandle>) -> Result<Json<ToggleOutcome>, ApiError> {
    Ok(Json(feed.toggle().await?))
}

async fn feed_reset(State(feed): State<FeedHandle>) -> Result<Json<FeedSnapshot>, ApiError> {
    Ok(Json(feed.reset().await?))
}
