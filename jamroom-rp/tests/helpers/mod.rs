//! Shared test fixtures: in-memory store, stub resolver, room builder.

// Each test binary uses a different subset of these helpers
#![allow(dead_code)]

use async_trait::async_trait;
use jamroom_common::events::RoomEvent;
use jamroom_rp::db;
use jamroom_rp::error::Result;
use jamroom_rp::resolver::{ResolvedSong, SongResolver};
use jamroom_rp::room::{Room, SessionStatus};
use jamroom_rp::transport::{ClockTransport, Transport, TransportEvent};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use uuid::Uuid;

/// Create an in-memory store with the room schema
pub async fn create_test_db() -> Pool<Sqlite> {
    // sqlx establishes the sqlite connection on a background thread that tokio's
    // timer does not track. Under `#[tokio::test(start_paused = true)]` the
    // runtime auto-advances the virtual clock whenever it would park, firing the
    // pool's acquire timeout before that thread reports success -> spurious
    // `PoolTimedOut`. Keeping one always-ready task alive stops the runtime from
    // parking during setup, so the clock does not jump; it is a harmless spin of
    // a few microseconds under real time.
    let keepalive = tokio::spawn(async {
        loop {
            tokio::task::yield_now().await;
        }
    });

    let pool = SqlitePoolOptions::new()
        .connect("sqlite::memory:")
        .await
        .unwrap();

    db::init::create_schema(&pool).await.unwrap();
    db::init::init_settings_defaults(&pool).await.unwrap();

    keepalive.abort();
    pool
}

/// Resolver stub backed by a fixed query -> candidates map
pub struct StubResolver {
    songs: HashMap<String, Vec<ResolvedSong>>,
}

impl StubResolver {
    /// Build from `(query, duration_secs)` pairs; each query resolves to one
    /// candidate named after it.
    pub fn with_songs(songs: &[(&str, i64)]) -> Self {
        let songs = songs
            .iter()
            .map(|(query, duration)| {
                (
                    query.to_string(),
                    vec![ResolvedSong {
                        media_url: format!("https://media.example/{query}"),
                        title: query.to_string(),
                        artist: "Test Artist".to_string(),
                        duration_secs: *duration,
                        thumbnail_url: None,
                    }],
                )
            })
            .collect();
        Self { songs }
    }
}

#[async_trait]
impl SongResolver for StubResolver {
    async fn resolve(&self, query: &str, limit: usize) -> Result<Vec<ResolvedSong>> {
        Ok(self
            .songs
            .get(query)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .take(limit)
            .collect())
    }
}

/// A room wired to a clock transport and a stub resolver, with one observer
pub struct TestRoom {
    pub room: Arc<Room>,
    pub db: Pool<Sqlite>,
    /// Clone of the transport event channel, for injecting disconnects
    pub transport_tx: mpsc::UnboundedSender<TransportEvent>,
    /// The test observer's event stream
    pub events: mpsc::UnboundedReceiver<RoomEvent>,
}

pub async fn build_room(songs: &[(&str, i64)]) -> TestRoom {
    let db = create_test_db().await;
    let (transport_tx, transport_rx) = mpsc::unbounded_channel();
    let transport: Arc<dyn Transport> = Arc::new(ClockTransport::new(transport_tx.clone()));
    let resolver: Arc<dyn SongResolver> = Arc::new(StubResolver::with_songs(songs));

    let room = Room::start(db.clone(), resolver, transport, transport_rx, "test-room".to_string())
        .await
        .unwrap();

    let mut events = room.bus().subscribe(Uuid::new_v4(), "test-observer").unwrap();
    // Swallow the subscription's own observer-count event
    let _ = events.try_recv();

    TestRoom {
        room,
        db,
        transport_tx,
        events,
    }
}

/// Give the room's background tasks a chance to drain pending events
pub async fn settle() {
    for _ in 0..5 {
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Pull buffered events off the observer stream
pub fn drain(rx: &mut mpsc::UnboundedReceiver<RoomEvent>) -> Vec<RoomEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Wait until an event of `kind` arrives, discarding others
pub async fn wait_for_event(rx: &mut mpsc::UnboundedReceiver<RoomEvent>, kind: &str) -> RoomEvent {
    collect_until(rx, kind).await.pop().unwrap()
}

/// Receive events until one of `kind` arrives; returns everything received,
/// with the matching event last.
pub async fn collect_until(
    rx: &mut mpsc::UnboundedReceiver<RoomEvent>,
    kind: &str,
) -> Vec<RoomEvent> {
    let mut seen = Vec::new();
    loop {
        match timeout(Duration::from_secs(300), rx.recv()).await {
            Ok(Some(event)) => {
                let found = event.kind() == kind;
                seen.push(event);
                if found {
                    return seen;
                }
            }
            _ => panic!("timed out waiting for {kind} event"),
        }
    }
}

/// Wait until the session reaches Playing (transport confirmed audio)
pub async fn wait_for_playing(room: &Room) {
    for _ in 0..1000 {
        if room.session_status().await == SessionStatus::Playing {
            return;
        }
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("room never reached the playing state");
}
