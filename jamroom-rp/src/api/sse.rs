//! SSE observer stream
//!
//! Observers connect with a subject identity and receive the room's event
//! stream. Connection ids deduplicate: reconnecting with the id of a live
//! subscription is rejected rather than duplicated. Dropping the HTTP
//! connection unsubscribes the observer.

use crate::api::AppContext;
use crate::notify::NotificationBus;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::IntoResponse,
    response::Response,
};
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SubscribeParams {
    /// Subject identity of the observer (e.g. a user name)
    pub subject: String,
    /// Stable connection id; omitted ids get a fresh one
    pub connection_id: Option<Uuid>,
}

/// GET /events - Subscribe to the room event stream
pub async fn event_stream(
    State(ctx): State<AppContext>,
    Query(params): Query<SubscribeParams>,
) -> Response {
    let connection_id = params.connection_id.unwrap_or_else(Uuid::new_v4);

    let Some(mut rx) = ctx.room.bus().subscribe(connection_id, &params.subject) else {
        return (
            StatusCode::CONFLICT,
            "connection id is already subscribed",
        )
            .into_response();
    };

    let guard = ObserverGuard {
        bus: ctx.room.bus().clone(),
        connection_id,
    };

    let stream = async_stream::stream! {
        let _guard = guard;
        while let Some(event) = rx.recv().await {
            match Event::default().event(event.kind()).json_data(&event) {
                Ok(sse_event) => yield Ok::<Event, Infallible>(sse_event),
                Err(e) => debug!("Skipping unserializable event: {}", e),
            }
        }
    };

    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(30))
                .text("keep-alive"),
        )
        .into_response()
}

/// Unsubscribes the observer when its SSE connection goes away
struct ObserverGuard {
    bus: NotificationBus,
    connection_id: Uuid,
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.connection_id);
    }
}
