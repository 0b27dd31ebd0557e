//! Audio transport abstraction
//!
//! The transport is the live streaming connection the room plays through.
//! Adapters implement [`Transport`] and report lifecycle changes as tagged
//! [`TransportEvent`] values on the channel they were constructed with; the
//! room routes every event through its own serialization point, so transport
//! callbacks can never interleave with user commands.

pub mod clock;

pub use clock::ClockTransport;

use crate::error::Result;
use async_trait::async_trait;

/// Tagged transport status events consumed by the playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    /// The stream started by `stream()` is now actively producing audio
    StreamingStarted { generation: u64 },
    /// The stream reached its natural end
    StreamEnded { generation: u64 },
    /// The connection was lost unexpectedly
    Disconnected,
    /// The connection is attempting to re-establish itself
    Reconnecting,
}

/// Live audio transport seam
///
/// `generation` tags the stream each event belongs to; events from a stream
/// that was abandoned by a later `stream()`/`stop()` carry a stale generation
/// and are discarded by the session.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Bind to the given target, reusing a live connection when one exists.
    async fn connect(&self, target: &str) -> Result<()>;

    /// Start streaming `media_url`, abandoning any in-flight stream
    /// immediately. Emits `StreamingStarted` once audio is flowing and
    /// `StreamEnded` when the item finishes naturally.
    async fn stream(&self, media_url: &str, duration_secs: u64, generation: u64) -> Result<()>;

    /// Pause the in-flight stream.
    async fn pause(&self) -> Result<()>;

    /// Resume a paused stream.
    async fn unpause(&self) -> Result<()>;

    /// Tear down the stream and the connection.
    async fn stop(&self) -> Result<()>;
}
