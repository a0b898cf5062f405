use super::state::AppState;
use crate::error::StreamError;
use crate::session::{RecordingStats, RecordingSummary};
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Start position in seconds (default: 0)
    pub start: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub service: String,
    pub audio_dir: String,
    pub metadata_dir: String,
    pub degradation_rate: f64,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for StreamError {
    fn into_response(self) -> Response {
        let status = match &self {
            StreamError::NotFound(_) => StatusCode::NOT_FOUND,
            StreamError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            StreamError::Format(_) => StatusCode::UNPROCESSABLE_ENTITY,
            StreamError::Ledger(_) | StreamError::Task(_) | StreamError::Io(_) => {
                error!("Request failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /
/// Service status
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatusResponse {
        status: "running".to_string(),
        service: state.info.name.clone(),
        audio_dir: state.info.audio_dir.clone(),
        metadata_dir: state.info.metadata_dir.clone(),
        degradation_rate: state.info.decay_rate,
    })
}

/// GET /tracks
/// All known recordings with their aggregate degradation
pub async fn list_tracks(State(state): State<AppState>) -> Json<Vec<RecordingSummary>> {
    Json(state.service.listing())
}

/// GET /stats/:filename
/// Per-region play counts for one recording
pub async fn get_stats(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<RecordingStats>, StreamError> {
    Ok(Json(state.service.stats(&filename)?))
}

/// GET /stream/:filename?start=<secs>
/// Stream a recording, wearing every region as it is delivered
pub async fn stream_audio(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    Query(query): Query<StreamQuery>,
) -> Result<Response, StreamError> {
    let start = query.start.unwrap_or(0.0);
    let session = state.service.open_session(&filename, start).await?;

    info!(
        "Listener session {} opened for {} at {:.2}s",
        session.id(),
        filename,
        start
    );

    let body = Body::from_stream(session.into_stream());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "audio/wav")
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", filename),
        )
        .header(header::ACCEPT_RANGES, "none")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(body)
        .map_err(|e| StreamError::Task(format!("Failed to build response: {}", e)))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
