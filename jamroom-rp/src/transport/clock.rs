//! Clock-driven transport adapter
//!
//! Streams an item in real time without touching audio bytes: the stream is
//! a timer that runs for the item's duration, freezes while paused, and is
//! abandoned the moment a new stream or a stop supersedes it. Used as the
//! in-process transport for rooms that have no live audio backend attached.

use super::{Transport, TransportEvent};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, info};

pub struct ClockTransport {
    events: mpsc::UnboundedSender<TransportEvent>,
    inner: Mutex<ClockInner>,
}

#[derive(Default)]
struct ClockInner {
    target: Option<String>,
    timer: Option<JoinHandle<()>>,
    remaining: Duration,
    started_at: Option<Instant>,
    generation: u64,
}

impl ClockTransport {
    pub fn new(events: mpsc::UnboundedSender<TransportEvent>) -> Self {
        Self {
            events,
            inner: Mutex::new(ClockInner::default()),
        }
    }

    fn spawn_countdown(
        events: mpsc::UnboundedSender<TransportEvent>,
        remaining: Duration,
        generation: u64,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            sleep(remaining).await;
            let _ = events.send(TransportEvent::StreamEnded { generation });
        })
    }
}

impl Drop for ClockTransport {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.lock() {
            if let Some(timer) = inner.timer.take() {
                timer.abort();
            }
        }
    }
}

#[async_trait]
impl Transport for ClockTransport {
    async fn connect(&self, target: &str) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| poisoned())?;

        if inner.target.as_deref() == Some(target) {
            debug!("Reusing live transport connection to {}", target);
        } else {
            inner.target = Some(target.to_string());
            info!("Transport connected to {}", target);
        }
        Ok(())
    }

    async fn stream(&self, media_url: &str, duration_secs: u64, generation: u64) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| poisoned())?;

        if inner.target.is_none() {
            return Err(Error::Transport("Not connected".to_string()));
        }

        // Abandon any in-flight stream immediately
        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }

        let remaining = Duration::from_secs(duration_secs);
        inner.remaining = remaining;
        inner.started_at = Some(Instant::now());
        inner.generation = generation;
        inner.timer = Some(Self::spawn_countdown(self.events.clone(), remaining, generation));

        debug!("Streaming {} for {}s (generation {})", media_url, duration_secs, generation);

        self.events
            .send(TransportEvent::StreamingStarted { generation })
            .map_err(|_| Error::Transport("Event channel closed".to_string()))?;

        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| poisoned())?;

        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }
        if let Some(started_at) = inner.started_at.take() {
            inner.remaining = inner.remaining.saturating_sub(started_at.elapsed());
        }

        debug!("Transport paused with {:?} remaining", inner.remaining);
        Ok(())
    }

    async fn unpause(&self) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| poisoned())?;

        if inner.target.is_none() {
            return Err(Error::Transport("Not connected".to_string()));
        }

        inner.started_at = Some(Instant::now());
        let generation = inner.generation;
        inner.timer = Some(Self::spawn_countdown(
            self.events.clone(),
            inner.remaining,
            generation,
        ));

        debug!("Transport resumed with {:?} remaining", inner.remaining);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| poisoned())?;

        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }
        inner.target = None;
        inner.started_at = None;
        inner.remaining = Duration::ZERO;

        info!("Transport torn down");
        Ok(())
    }
}

fn poisoned() -> Error {
    Error::Transport("Transport state lock poisoned".to_string())
}
