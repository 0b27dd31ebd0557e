//! Observer notification bus
//!
//! Fan-out of room events to subscribed observers. Each observer owns an
//! unbounded channel drained by its SSE connection; a failed send to one
//! observer never blocks delivery to the rest, and a failed observer is only
//! removed when its own disconnect arrives.

use jamroom_common::events::RoomEvent;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

struct Observer {
    subject: String,
    tx: mpsc::UnboundedSender<RoomEvent>,
}

#[derive(Clone, Default)]
pub struct NotificationBus {
    inner: Arc<Mutex<HashMap<Uuid, Observer>>>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn observers(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Observer>> {
        // A panic while holding the map leaves it structurally intact
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register an observer connection.
    ///
    /// Idempotent by connection id: re-subscribing an id that is already
    /// registered is a no-op and returns None. On success the updated
    /// observer count is broadcast to everyone, including the new observer.
    pub fn subscribe(
        &self,
        connection_id: Uuid,
        subject: &str,
    ) -> Option<mpsc::UnboundedReceiver<RoomEvent>> {
        let (count, rx) = {
            let mut observers = self.observers();

            if observers.contains_key(&connection_id) {
                debug!("Duplicate subscribe for connection {} ignored", connection_id);
                return None;
            }

            let (tx, rx) = mpsc::unbounded_channel();
            observers.insert(
                connection_id,
                Observer {
                    subject: subject.to_string(),
                    tx,
                },
            );
            info!("Observer {} subscribed for subject {}", connection_id, subject);

            (observers.len(), rx)
        };
        self.broadcast(RoomEvent::observer_count_changed(count));
        Some(rx)
    }

    /// Remove an observer connection; no-op when absent.
    pub fn unsubscribe(&self, connection_id: Uuid) -> bool {
        let removed = {
            let mut observers = self.observers();
            match observers.remove(&connection_id) {
                Some(observer) => {
                    info!(
                        "Observer {} (subject {}) unsubscribed",
                        connection_id, observer.subject
                    );
                    Some(observers.len())
                }
                None => None,
            }
        };

        match removed {
            Some(count) => {
                self.broadcast(RoomEvent::observer_count_changed(count));
                true
            }
            None => false,
        }
    }

    /// Send an event to every registered observer.
    pub fn broadcast(&self, event: RoomEvent) {
        let observers = self.observers();

        for (connection_id, observer) in observers.iter() {
            if observer.tx.send(event.clone()).is_err() {
                // Receiver already gone; the observer is removed when its
                // disconnect signal arrives, not here.
                warn!("Dropped {} event for observer {}", event.kind(), connection_id);
            }
        }
    }

    /// Current number of registered observers
    pub fn observer_count(&self) -> usize {
        self.observers().len()
    }
}
