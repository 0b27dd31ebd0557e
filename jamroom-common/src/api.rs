//! Shared API view types
//!
//! Response shapes served by the room player and consumed by web clients.

use serde::{Deserialize, Serialize};

use crate::events::QueueItemInfo;

/// Full queue view: upcoming items, history, cursor, and loop flag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueView {
    /// Items at or after the cursor, ascending by position
    pub upcoming: Vec<QueueItemInfo>,
    /// Items before the cursor, descending by position (most recent first)
    pub history: Vec<QueueItemInfo>,
    /// Persisted cursor position
    pub current_position: i64,
    /// Whether finished items are re-enqueued at the tail
    pub looping: bool,
}

/// Now-playing view for the current queue item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NowPlaying {
    /// The item at the cursor
    pub item: QueueItemInfo,
    /// Seconds of playback elapsed
    pub elapsed_seconds: u64,
    /// Whether a playback session is engaged
    pub active: bool,
    /// Whether playback is paused
    pub paused: bool,
}
