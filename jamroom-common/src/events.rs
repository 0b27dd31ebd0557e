//! Event types for the Jamroom notification protocol
//!
//! Every observable state change in a listening room is pushed to subscribed
//! observers as one of these events. Events are serialized with a `type` tag
//! for SSE transmission and exhaustive matching on the client side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Queue item details carried by queue and playback events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItemInfo {
    /// Store-issued item id (monotonic, opaque to clients)
    pub id: i64,
    /// Position in the room queue
    pub position: i64,
    /// Identity of the user who submitted the item
    pub submitter: String,
    /// Item title
    pub title: String,
    /// Item artist
    pub artist: String,
    /// Playback duration in seconds
    pub duration_secs: i64,
    /// Streamable media reference
    pub media_url: String,
    /// Artwork reference, if the resolver provided one
    pub thumbnail_url: Option<String>,
}

/// Room event types
///
/// Broadcast by the notification bus to every subscribed observer.
/// The serialized `type` tag doubles as the SSE event name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEvent {
    /// Number of subscribed observers changed (join or leave)
    ObserverCountChanged {
        /// Observer count after the change
        count: usize,
        /// When the count changed
        timestamp: DateTime<Utc>,
    },

    /// An item was appended to the queue
    QueueItemAdded {
        /// The stored item
        item: QueueItemInfo,
        /// When the item was committed
        timestamp: DateTime<Utc>,
    },

    /// An item was removed from the queue by position
    QueueItemRemoved {
        /// Store-issued id of the removed item
        item_id: i64,
        /// Position the item occupied
        position: i64,
        /// When the item was removed
        timestamp: DateTime<Utc>,
    },

    /// Playback state changed (started, paused, resumed, loop toggled,
    /// or the once-per-second elapsed update while playing)
    PlaybackStateChanged {
        /// Item id when a new item starts; None for in-place updates
        item_id: Option<i64>,
        /// Whether a session is engaged (playing or paused)
        active: bool,
        /// Whether playback is paused
        paused: bool,
        /// Whether the queue loop flag is set
        looping: bool,
        /// Seconds of playback elapsed on the current item
        elapsed_seconds: u64,
        /// When the state changed
        timestamp: DateTime<Utc>,
    },

    /// Playback stopped and the upcoming queue was cleared
    PlaybackStopped {
        /// When playback stopped
        timestamp: DateTime<Utc>,
    },

    /// The transport was lost and did not recover within the grace window
    PlaybackDisconnected {
        /// When the disconnect was declared permanent
        timestamp: DateTime<Utc>,
    },
}

impl RoomEvent {
    /// SSE event name for this variant (matches the serialized `type` tag)
    pub fn kind(&self) -> &'static str {
        match self {
            RoomEvent::ObserverCountChanged { .. } => "observer_count_changed",
            RoomEvent::QueueItemAdded { .. } => "queue_item_added",
            RoomEvent::QueueItemRemoved { .. } => "queue_item_removed",
            RoomEvent::PlaybackStateChanged { .. } => "playback_state_changed",
            RoomEvent::PlaybackStopped { .. } => "playback_stopped",
            RoomEvent::PlaybackDisconnected { .. } => "playback_disconnected",
        }
    }

    /// Create an ObserverCountChanged event
    pub fn observer_count_changed(count: usize) -> Self {
        Self::ObserverCountChanged {
            count,
            timestamp: Utc::now(),
        }
    }

    /// Create a QueueItemAdded event
    pub fn queue_item_added(item: QueueItemInfo) -> Self {
        Self::QueueItemAdded {
            item,
            timestamp: Utc::now(),
        }
    }

    /// Create a QueueItemRemoved event
    pub fn queue_item_removed(item_id: i64, position: i64) -> Self {
        Self::QueueItemRemoved {
            item_id,
            position,
            timestamp: Utc::now(),
        }
    }

    /// Create a PlaybackStateChanged event
    pub fn playback_state_changed(
        item_id: Option<i64>,
        active: bool,
        paused: bool,
        looping: bool,
        elapsed_seconds: u64,
    ) -> Self {
        Self::PlaybackStateChanged {
            item_id,
            active,
            paused,
            looping,
            elapsed_seconds,
            timestamp: Utc::now(),
        }
    }

    /// Create a PlaybackStopped event
    pub fn playback_stopped() -> Self {
        Self::PlaybackStopped {
            timestamp: Utc::now(),
        }
    }

    /// Create a PlaybackDisconnected event
    pub fn playback_disconnected() -> Self {
        Self::PlaybackDisconnected {
            timestamp: Utc::now(),
        }
    }
}
