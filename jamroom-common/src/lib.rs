//! # Jamroom Common Library
//!
//! Shared code for the Jamroom listening-room services:
//! - Event types (RoomEvent enum) broadcast to observers
//! - Queue / now-playing view types shared between server and clients

pub mod api;
pub mod events;

pub use events::{QueueItemInfo, RoomEvent};
