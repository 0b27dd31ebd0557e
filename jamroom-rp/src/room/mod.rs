//! Room orchestration
//!
//! Composes the queue manager, the playback session, and the notification
//! bus into the externally callable room operations. Every mutation of the
//! cursor, the loop flag, or the session goes through one `Mutex<RoomCore>`:
//! user commands, transport events, the elapsed tick, and the disconnect
//! grace timer all serialize on it, so an end-of-stream can never interleave
//! with a concurrent skip or stop.
//!
//! Events are broadcast only after the mutation they report has been
//! committed to the store.

pub mod queue;
pub mod session;

pub use queue::QueueManager;
pub use session::{PlaybackSession, SessionStatus};

use crate::db::settings;
use crate::error::{Error, Result};
use crate::notify::NotificationBus;
use crate::resolver::SongResolver;
use crate::transport::{Transport, TransportEvent};
use jamroom_common::api::{NowPlaying, QueueView};
use jamroom_common::events::{QueueItemInfo, RoomEvent};
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Result of adding an item to the queue
#[derive(Debug, Clone)]
pub struct AddOutcome {
    /// The stored item
    pub item: QueueItemInfo,
    /// Whether the add started an idle session
    pub started: bool,
}

/// Result of a skip request
#[derive(Debug, Clone)]
pub enum SkipOutcome {
    /// The cursor moved and the transport was redirected to this item
    Skipped(QueueItemInfo),
    /// The queue was exhausted; playback stopped
    Stopped,
}

/// Result of a pause/resume toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseToggle {
    Paused,
    Resumed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Requested,
    Exhausted,
    Disconnected,
}

struct RoomCore {
    queue: QueueManager,
    session: PlaybackSession,
}

/// One listening room: a queue, at most one live session, and its observers
pub struct Room {
    core: Mutex<RoomCore>,
    bus: NotificationBus,
    resolver: Arc<dyn SongResolver>,
    transport: Arc<dyn Transport>,
    transport_target: String,
    disconnect_grace: Duration,
}

impl Room {
    /// Build the room and spawn its background tasks: the transport event
    /// loop and the one-second elapsed tick. Both hold only a weak handle,
    /// so dropping the last strong `Arc<Room>` shuts them down.
    pub async fn start(
        db: Pool<Sqlite>,
        resolver: Arc<dyn SongResolver>,
        transport: Arc<dyn Transport>,
        transport_events: mpsc::UnboundedReceiver<TransportEvent>,
        transport_target: String,
    ) -> Result<Arc<Self>> {
        let grace_ms = settings::load_disconnect_grace_ms(&db).await?;
        let queue = QueueManager::load(db).await?;

        let room = Arc::new(Self {
            core: Mutex::new(RoomCore {
                queue,
                session: PlaybackSession::new(),
            }),
            bus: NotificationBus::new(),
            resolver,
            transport,
            transport_target,
            disconnect_grace: Duration::from_millis(grace_ms),
        });

        spawn_event_loop(&room, transport_events);
        spawn_tick(&room);
        info!("Room started (transport target {:?})", room.transport_target);

        Ok(room)
    }

    /// Observer bus for this room
    pub fn bus(&self) -> &NotificationBus {
        &self.bus
    }

    // ------------------------------------------------------------------
    // Facade operations
    // ------------------------------------------------------------------

    /// Resolve `query`, enqueue the best candidate, and begin playback when
    /// the session is idle.
    pub async fn add_and_maybe_start(&self, query: &str, submitter: &str) -> Result<AddOutcome> {
        // Resolution is network I/O with its own timeout; it happens before
        // the room lock so it cannot stall commands or timers.
        let candidates = self.resolver.resolve(query, 1).await?;
        let Some(song) = candidates.into_iter().next() else {
            return Err(Error::Resolution(format!("No match for {:?}", query)));
        };

        let mut core = self.core.lock().await;
        let row = core.queue.enqueue(&song, submitter).await?;
        let item = QueueItemInfo::from(row);
        info!(
            "{} added {:?} at position {}",
            submitter, item.title, item.position
        );
        self.bus.broadcast(RoomEvent::queue_item_added(item.clone()));

        let started = if core.session.is_idle() {
            self.begin_locked(&mut core).await?
        } else {
            false
        };

        Ok(AddOutcome { item, started })
    }

    /// Start playing the item at the cursor.
    ///
    /// Returns false (no-op) when a session is already engaged or nothing
    /// sits at the cursor.
    pub async fn begin_playback(&self) -> Result<bool> {
        let mut core = self.core.lock().await;
        self.begin_locked(&mut core).await
    }

    /// Skip to the next item, or stop when the queue is exhausted.
    pub async fn skip_or_stop(&self) -> Result<SkipOutcome> {
        let mut core = self.core.lock().await;
        if !core.session.is_playing() && !core.session.is_paused() {
            return Err(Error::InvalidOperation("Nothing is playing".to_string()));
        }
        self.advance_locked(&mut core).await
    }

    /// Stop playback, clear the upcoming queue, and tear down the transport.
    pub async fn stop(&self) -> Result<()> {
        let mut core = self.core.lock().await;
        if core.session.is_idle() {
            return Err(Error::InvalidOperation("Nothing is playing".to_string()));
        }
        self.stop_locked(&mut core, StopReason::Requested).await
    }

    /// Toggle between paused and playing.
    pub async fn pause_resume(&self) -> Result<PauseToggle> {
        let mut core = self.core.lock().await;
        let looping = core.queue.looping();

        if core.session.is_playing() {
            self.transport.pause().await?;
            core.session.pause();
            let elapsed = core.session.elapsed_seconds();
            info!("Playback paused at {}s", elapsed);
            self.bus
                .broadcast(RoomEvent::playback_state_changed(None, true, true, looping, elapsed));
            Ok(PauseToggle::Paused)
        } else if core.session.is_paused() {
            self.transport.unpause().await?;
            core.session.resume();
            let elapsed = core.session.elapsed_seconds();
            info!("Playback resumed at {}s", elapsed);
            self.bus
                .broadcast(RoomEvent::playback_state_changed(None, true, false, looping, elapsed));
            Ok(PauseToggle::Resumed)
        } else {
            Err(Error::InvalidOperation("Nothing is playing".to_string()))
        }
    }

    /// Toggle the loop flag, returning the new value.
    pub async fn toggle_loop(&self) -> Result<bool> {
        let mut core = self.core.lock().await;
        let looping = core.queue.toggle_loop();
        info!("Loop flag set to {}", looping);
        self.bus.broadcast(RoomEvent::playback_state_changed(
            None,
            core.session.is_engaged(),
            core.session.is_paused(),
            looping,
            core.session.elapsed_seconds(),
        ));
        Ok(looping)
    }

    /// Remove the item at `position`; the current position is rejected.
    pub async fn remove_at(&self, position: i64) -> Result<QueueItemInfo> {
        let core = self.core.lock().await;
        let row = core.queue.dequeue(position).await?;
        let item = QueueItemInfo::from(row);
        info!("Removed {:?} from position {}", item.title, item.position);
        self.bus
            .broadcast(RoomEvent::queue_item_removed(item.id, item.position));
        Ok(item)
    }

    /// Upcoming and history views with the cursor and loop flag.
    pub async fn queue_view(&self) -> Result<QueueView> {
        let core = self.core.lock().await;
        let upcoming = core
            .queue
            .list_upcoming()
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        let history = core
            .queue
            .list_history()
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        Ok(QueueView {
            upcoming,
            history,
            current_position: core.queue.current_position(),
            looping: core.queue.looping(),
        })
    }

    /// Current session status
    pub async fn session_status(&self) -> SessionStatus {
        self.core.lock().await.session.status()
    }

    /// The item at the cursor with session state, or None when absent.
    pub async fn now_playing(&self) -> Result<Option<NowPlaying>> {
        let core = self.core.lock().await;
        let Some(row) = core.queue.peek_current().await? else {
            return Ok(None);
        };

        Ok(Some(NowPlaying {
            item: row.into(),
            elapsed_seconds: core.session.elapsed_seconds(),
            active: core.session.is_engaged(),
            paused: core.session.is_paused(),
        }))
    }

    // ------------------------------------------------------------------
    // Internals (called with the core lock held)
    // ------------------------------------------------------------------

    async fn begin_locked(&self, core: &mut RoomCore) -> Result<bool> {
        if !core.session.is_idle() {
            debug!("Begin rejected: session is {}", core.session.status());
            return Ok(false);
        }

        let Some(item) = core.queue.peek_current().await? else {
            debug!("Begin rejected: nothing at cursor {}", core.queue.current_position());
            return Ok(false);
        };

        let generation = core.session.start_stream(item.position);

        if let Err(e) = self.transport.connect(&self.transport_target).await {
            core.session.reset_to_idle();
            return Err(e);
        }
        if let Err(e) = self
            .transport
            .stream(&item.media_url, item.duration_secs.max(0) as u64, generation)
            .await
        {
            core.session.reset_to_idle();
            return Err(e);
        }

        info!("Starting {:?} at position {}", item.title, item.position);
        Ok(true)
    }

    async fn advance_locked(&self, core: &mut RoomCore) -> Result<SkipOutcome> {
        match core.queue.advance().await? {
            None => {
                info!("Queue exhausted; stopping playback");
                self.stop_locked(core, StopReason::Exhausted).await?;
                Ok(SkipOutcome::Stopped)
            }
            Some(item) => {
                // The old stream is abandoned immediately; no waiting on it
                let generation = core.session.start_stream(item.position);
                if let Err(e) = self
                    .transport
                    .stream(&item.media_url, item.duration_secs.max(0) as u64, generation)
                    .await
                {
                    core.session.reset_to_idle();
                    if let Err(stop_err) = self.transport.stop().await {
                        warn!("Transport teardown after stream failure: {}", stop_err);
                    }
                    return Err(e);
                }

                info!("Skipped to {:?} at position {}", item.title, item.position);
                Ok(SkipOutcome::Skipped(item.into()))
            }
        }
    }

    async fn stop_locked(&self, core: &mut RoomCore, reason: StopReason) -> Result<()> {
        core.session.begin_stopping();

        let cleared = core.queue.clear_upcoming().await?;
        core.queue.set_loop(false);

        if let Err(e) = self.transport.stop().await {
            warn!("Transport teardown failed: {}", e);
        }
        core.session.reset_to_idle();

        info!("Playback stopped; {} upcoming items cleared", cleared);
        self.bus.broadcast(RoomEvent::playback_stopped());
        if reason == StopReason::Disconnected {
            self.bus.broadcast(RoomEvent::playback_disconnected());
        }

        Ok(())
    }

    /// One-second elapsed update while actively playing
    async fn elapsed_tick(&self) {
        let mut core = self.core.lock().await;
        if let Some(elapsed) = core.session.tick() {
            let looping = core.queue.looping();
            self.bus
                .broadcast(RoomEvent::playback_state_changed(None, true, false, looping, elapsed));
        }
    }
}

// ----------------------------------------------------------------------
// Background tasks
//
// All of these hold only a weak room handle; they exit once the last
// strong Arc<Room> is dropped, and they acquire the room core before
// touching any state.
// ----------------------------------------------------------------------

fn spawn_event_loop(room: &Arc<Room>, mut events: mpsc::UnboundedReceiver<TransportEvent>) {
    let weak = Arc::downgrade(room);
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let Some(room) = weak.upgrade() else { break };
            handle_transport_event(&room, event).await;
        }
    });
}

fn spawn_tick(room: &Arc<Room>) {
    let weak = Arc::downgrade(room);
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(1));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tick.tick().await;
            let Some(room) = weak.upgrade() else { break };
            room.elapsed_tick().await;
        }
    });
}

async fn handle_transport_event(room: &Arc<Room>, event: TransportEvent) {
    match event {
        TransportEvent::StreamingStarted { generation } => {
            let mut core = room.core.lock().await;
            if core.session.mark_playing(generation) {
                let item_id = match core.queue.peek_current().await {
                    Ok(row) => row.map(|r| r.id),
                    Err(e) => {
                        error!("Failed to read current item: {}", e);
                        None
                    }
                };
                let looping = core.queue.looping();
                debug!("Transport streaming (generation {})", generation);
                room.bus.broadcast(RoomEvent::playback_state_changed(
                    item_id, true, false, looping, 0,
                ));
            } else {
                debug!("Ignoring stale streaming-started (generation {})", generation);
            }
        }

        TransportEvent::StreamEnded { generation } => {
            let mut core = room.core.lock().await;
            let relevant = core.session.is_current(generation)
                && (core.session.is_playing() || core.session.is_paused());
            if relevant {
                debug!("Stream ended (generation {}); advancing", generation);
                if let Err(e) = room.advance_locked(&mut core).await {
                    error!("Advance after end of stream failed: {}", e);
                }
            } else {
                debug!("Ignoring stale stream-ended (generation {})", generation);
            }
        }

        TransportEvent::Disconnected => {
            let epoch = {
                let mut core = room.core.lock().await;
                core.session.note_disconnect()
            };
            if let Some(epoch) = epoch {
                warn!(
                    "Transport disconnected; waiting {:?} for a reconnect signal",
                    room.disconnect_grace
                );
                spawn_grace_timer(room, epoch);
            }
        }

        TransportEvent::Reconnecting => {
            let mut core = room.core.lock().await;
            if core.session.note_reconnecting() {
                info!("Transport reconnecting; disconnect was transient");
            }
        }
    }
}

fn spawn_grace_timer(room: &Arc<Room>, epoch: u64) {
    let weak = Arc::downgrade(room);
    let grace = room.disconnect_grace;
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        let Some(room) = weak.upgrade() else { return };

        let mut core = room.core.lock().await;
        if core.session.disconnect_pending(epoch) && !core.session.is_idle() {
            warn!("No reconnect within the grace window; treating disconnect as permanent");
            if let Err(e) = room.stop_locked(&mut core, StopReason::Disconnected).await {
                error!("Stop after permanent disconnect failed: {}", e);
            }
        }
    });
}
