//! HTTP request handlers
//!
//! Thin translations between HTTP and the room facade. Rejected
//! preconditions map to 409, missing resources and failed resolutions to
//! 404, everything else to 500.

use crate::api::AppContext;
use crate::error::Error;
use crate::room::{PauseToggle, SkipOutcome};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use jamroom_common::api::{NowPlaying, QueueView};
use jamroom_common::events::QueueItemInfo;
use serde::{Deserialize, Serialize};
use tracing::error;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
pub struct AddRequest {
    query: String,
    submitter: String,
}

#[derive(Debug, Serialize)]
pub struct AddResponse {
    item: QueueItemInfo,
    started: bool,
}

#[derive(Debug, Serialize)]
pub struct SkipResponse {
    result: String,
    item: Option<QueueItemInfo>,
}

#[derive(Debug, Serialize)]
pub struct PauseResponse {
    state: String,
}

#[derive(Debug, Serialize)]
pub struct LoopResponse {
    looping: bool,
}

#[derive(Debug, Serialize)]
pub struct RemoveResponse {
    item_id: i64,
    position: i64,
}

type ApiError = (StatusCode, Json<StatusResponse>);

fn error_response(e: Error) -> ApiError {
    let status = match &e {
        Error::InvalidOperation(_) => StatusCode::CONFLICT,
        Error::NotFound(_) | Error::Resolution(_) => StatusCode::NOT_FOUND,
        _ => {
            error!("Request failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(StatusResponse {
            status: format!("error: {}", e),
        }),
    )
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "jamroom-rp".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Playback Endpoints
// ============================================================================

/// GET /playback - Now-playing view
pub async fn now_playing(
    State(ctx): State<AppContext>,
) -> Result<Json<NowPlaying>, ApiError> {
    match ctx.room.now_playing().await {
        Ok(Some(view)) => Ok(Json(view)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(StatusResponse {
                status: "error: nothing at the current position".to_string(),
            }),
        )),
        Err(e) => Err(error_response(e)),
    }
}

/// POST /playback/begin - Start playing the item at the cursor
pub async fn begin(State(ctx): State<AppContext>) -> Result<Json<StatusResponse>, ApiError> {
    match ctx.room.begin_playback().await {
        Ok(true) => Ok(Json(StatusResponse {
            status: "started".to_string(),
        })),
        Ok(false) => Err((
            StatusCode::CONFLICT,
            Json(StatusResponse {
                status: "error: already playing or nothing queued".to_string(),
            }),
        )),
        Err(e) => Err(error_response(e)),
    }
}

/// POST /playback/skip - Advance to the next item or stop when exhausted
pub async fn skip(State(ctx): State<AppContext>) -> Result<Json<SkipResponse>, ApiError> {
    match ctx.room.skip_or_stop().await {
        Ok(SkipOutcome::Skipped(item)) => Ok(Json(SkipResponse {
            result: "skipped".to_string(),
            item: Some(item),
        })),
        Ok(SkipOutcome::Stopped) => Ok(Json(SkipResponse {
            result: "stopped".to_string(),
            item: None,
        })),
        Err(e) => Err(error_response(e)),
    }
}

/// POST /playback/stop - Stop playback and clear the upcoming queue
pub async fn stop(State(ctx): State<AppContext>) -> Result<Json<StatusResponse>, ApiError> {
    match ctx.room.stop().await {
        Ok(()) => Ok(Json(StatusResponse {
            status: "stopped".to_string(),
        })),
        Err(e) => Err(error_response(e)),
    }
}

/// POST /playback/toggle-pause - Flip between paused and playing
pub async fn toggle_pause(State(ctx): State<AppContext>) -> Result<Json<PauseResponse>, ApiError> {
    match ctx.room.pause_resume().await {
        Ok(PauseToggle::Paused) => Ok(Json(PauseResponse {
            state: "paused".to_string(),
        })),
        Ok(PauseToggle::Resumed) => Ok(Json(PauseResponse {
            state: "playing".to_string(),
        })),
        Err(e) => Err(error_response(e)),
    }
}

// ============================================================================
// Queue Endpoints
// ============================================================================

/// GET /queue - Upcoming, history, cursor, and loop flag
pub async fn get_queue(State(ctx): State<AppContext>) -> Result<Json<QueueView>, ApiError> {
    ctx.room.queue_view().await.map(Json).map_err(error_response)
}

/// POST /queue/add - Resolve a query and enqueue the result
pub async fn add_to_queue(
    State(ctx): State<AppContext>,
    Json(req): Json<AddRequest>,
) -> Result<Json<AddResponse>, ApiError> {
    match ctx.room.add_and_maybe_start(&req.query, &req.submitter).await {
        Ok(outcome) => Ok(Json(AddResponse {
            item: outcome.item,
            started: outcome.started,
        })),
        Err(e) => Err(error_response(e)),
    }
}

/// DELETE /queue/:position - Remove the item at a position
pub async fn remove_from_queue(
    State(ctx): State<AppContext>,
    Path(position): Path<i64>,
) -> Result<Json<RemoveResponse>, ApiError> {
    match ctx.room.remove_at(position).await {
        Ok(item) => Ok(Json(RemoveResponse {
            item_id: item.id,
            position: item.position,
        })),
        Err(e) => Err(error_response(e)),
    }
}

/// POST /queue/toggle-loop - Flip the loop flag
pub async fn toggle_loop(State(ctx): State<AppContext>) -> Result<Json<LoopResponse>, ApiError> {
    match ctx.room.toggle_loop().await {
        Ok(looping) => Ok(Json(LoopResponse { looping })),
        Err(e) => Err(error_response(e)),
    }
}
