//! REST API implementation for the room player
//!
//! Command routes mirror the facade operations one-to-one; observers
//! subscribe on `/events` and receive the room event stream over SSE.

pub mod handlers;
pub mod sse;

use crate::room::Room;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppContext {
    /// The listening room
    pub room: Arc<Room>,
    /// Server port
    pub port: u16,
}

/// Create the API router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))

        // Playback control
        .route("/playback", get(handlers::now_playing))
        .route("/playback/begin", post(handlers::begin))
        .route("/playback/skip", post(handlers::skip))
        .route("/playback/stop", post(handlers::stop))
        .route("/playback/toggle-pause", post(handlers::toggle_pause))

        // Queue management
        .route("/queue", get(handlers::get_queue))
        .route("/queue/add", post(handlers::add_to_queue))
        .route("/queue/:position", delete(handlers::remove_from_queue))
        .route("/queue/toggle-loop", post(handlers::toggle_loop))

        // SSE observer stream
        .route("/events", get(sse::event_stream))

        // Attach application context
        .with_state(ctx)

        // Enable CORS for web clients
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
