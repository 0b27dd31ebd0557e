//! # Jamroom Room Player Library (jamroom-rp)
//!
//! Playback and queue orchestration engine for a shared listening room.
//!
//! **Purpose:** Maintain one ordered queue per room, drive at most one live
//! playback session through an audio transport, and fan out state-change
//! events to subscribed observers.
//!
//! **Architecture:** Single serialized room core (queue cursor + session
//! state machine) with transport events, user commands, and timers all
//! funneled through the same lock; HTTP/SSE control surface on axum.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod notify;
pub mod resolver;
pub mod room;
pub mod transport;

pub use error::{Error, Result};
pub use room::Room;
