//! Playback session state machine
//!
//! Ephemeral state for the at-most-one live stream in a room. The struct
//! holds state and transition guards only; the orchestration in
//! [`crate::room`] drives the transport and the queue around it, always from
//! behind the room's single lock.
//!
//! Stream generations disambiguate transport events: every new stream (and
//! every teardown) bumps the counter, so events from an abandoned stream
//! carry a stale generation and are discarded.

use serde::Serialize;

/// Session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// No stream; the room is quiet
    Idle,
    /// A stream was requested and the transport has not confirmed audio yet
    Starting,
    /// Audio is flowing
    Playing,
    /// Stream held in place, elapsed time frozen
    Paused,
    /// Teardown in progress
    Stopping,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Idle => write!(f, "idle"),
            SessionStatus::Starting => write!(f, "starting"),
            SessionStatus::Playing => write!(f, "playing"),
            SessionStatus::Paused => write!(f, "paused"),
            SessionStatus::Stopping => write!(f, "stopping"),
        }
    }
}

/// Ephemeral playback session state
#[derive(Debug)]
pub struct PlaybackSession {
    status: SessionStatus,
    elapsed_seconds: u64,
    bound_position: Option<i64>,
    generation: u64,
    pending_disconnect: Option<u64>,
    disconnect_epoch: u64,
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self {
            status: SessionStatus::Idle,
            elapsed_seconds: 0,
            bound_position: None,
            generation: 0,
            pending_disconnect: None,
            disconnect_epoch: 0,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_idle(&self) -> bool {
        self.status == SessionStatus::Idle
    }

    /// A session is engaged while a stream is starting, playing, or paused
    pub fn is_engaged(&self) -> bool {
        matches!(
            self.status,
            SessionStatus::Starting | SessionStatus::Playing | SessionStatus::Paused
        )
    }

    pub fn is_playing(&self) -> bool {
        self.status == SessionStatus::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.status == SessionStatus::Paused
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn bound_position(&self) -> Option<i64> {
        self.bound_position
    }

    /// Whether `generation` identifies the stream currently bound
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Bind a new stream for the item at `position`: Starting, elapsed reset,
    /// fresh generation. Returns the generation to tag the stream with.
    pub fn start_stream(&mut self, position: i64) -> u64 {
        self.status = SessionStatus::Starting;
        self.bound_position = Some(position);
        self.elapsed_seconds = 0;
        self.generation += 1;
        self.generation
    }

    /// Transport confirmed audio for `generation`: Starting -> Playing.
    /// Rejected for a stale generation or outside Starting.
    pub fn mark_playing(&mut self, generation: u64) -> bool {
        if self.status == SessionStatus::Starting && self.generation == generation {
            self.status = SessionStatus::Playing;
            true
        } else {
            false
        }
    }

    /// Playing -> Paused; rejected otherwise
    pub fn pause(&mut self) -> bool {
        if self.status == SessionStatus::Playing {
            self.status = SessionStatus::Paused;
            true
        } else {
            false
        }
    }

    /// Paused -> Playing; rejected otherwise
    pub fn resume(&mut self) -> bool {
        if self.status == SessionStatus::Paused {
            self.status = SessionStatus::Playing;
            true
        } else {
            false
        }
    }

    /// Any non-Idle state -> Stopping
    pub fn begin_stopping(&mut self) -> bool {
        if self.status == SessionStatus::Idle {
            false
        } else {
            self.status = SessionStatus::Stopping;
            true
        }
    }

    /// Return to Idle, clearing stream bindings and invalidating any
    /// in-flight transport events.
    pub fn reset_to_idle(&mut self) {
        self.status = SessionStatus::Idle;
        self.bound_position = None;
        self.elapsed_seconds = 0;
        self.generation += 1;
        self.pending_disconnect = None;
    }

    /// One-second tick. While Playing, returns the elapsed seconds to report
    /// and then increments; while Idle, resets the counter. Elapsed time is
    /// frozen in every other state.
    pub fn tick(&mut self) -> Option<u64> {
        match self.status {
            SessionStatus::Playing => {
                let elapsed = self.elapsed_seconds;
                self.elapsed_seconds += 1;
                Some(elapsed)
            }
            SessionStatus::Idle => {
                self.elapsed_seconds = 0;
                None
            }
            _ => None,
        }
    }

    /// Record an unexpected transport loss. Returns the epoch the grace
    /// timer should watch, or None when the session is Idle.
    pub fn note_disconnect(&mut self) -> Option<u64> {
        if self.status == SessionStatus::Idle {
            return None;
        }
        self.disconnect_epoch += 1;
        self.pending_disconnect = Some(self.disconnect_epoch);
        Some(self.disconnect_epoch)
    }

    /// The transport is re-establishing itself: the pending disconnect was
    /// transient. Returns whether one was pending.
    pub fn note_reconnecting(&mut self) -> bool {
        self.pending_disconnect.take().is_some()
    }

    /// Whether the disconnect recorded at `epoch` is still unresolved
    pub fn disconnect_pending(&self, epoch: u64) -> bool {
        self.pending_disconnect == Some(epoch)
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new()
    }
}
