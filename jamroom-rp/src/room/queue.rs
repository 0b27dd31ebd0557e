//! Queue manager
//!
//! Owns the persisted playback cursor and the process-lifetime loop flag.
//! Positions below the cursor are history; at-or-above are upcoming. All
//! mutations run behind the room lock, so position assignment and cursor
//! movement never race with each other.

use crate::db::{queue, settings};
use crate::db::queue::QueueRow;
use crate::error::{Error, Result};
use crate::resolver::ResolvedSong;
use sqlx::{Pool, Sqlite};
use tracing::{debug, info};

pub struct QueueManager {
    db: Pool<Sqlite>,
    current_position: i64,
    looping: bool,
    retention_window: i64,
}

impl QueueManager {
    /// Load the cursor and retention window from the store.
    ///
    /// An empty store yields cursor 0 with no item present: peeks return
    /// None and playback starts are no-ops until an enqueue succeeds.
    pub async fn load(db: Pool<Sqlite>) -> Result<Self> {
        let current_position = settings::load_cursor(&db).await?;
        let retention_window = settings::load_retention_window(&db).await?;
        info!(
            "Queue manager loaded: cursor at {}, retention window {}",
            current_position, retention_window
        );

        Ok(Self {
            db,
            current_position,
            looping: false,
            retention_window,
        })
    }

    pub fn current_position(&self) -> i64 {
        self.current_position
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn set_loop(&mut self, on: bool) -> bool {
        self.looping = on;
        self.looping
    }

    pub fn toggle_loop(&mut self) -> bool {
        self.looping = !self.looping;
        self.looping
    }

    /// Append a resolved song and apply the retention window.
    ///
    /// The insert commits before this returns; callers broadcast only after.
    pub async fn enqueue(&self, song: &ResolvedSong, submitter: &str) -> Result<QueueRow> {
        let row = queue::append(&self.db, song, submitter, self.current_position).await?;
        debug!(
            "Enqueued {:?} at position {} (id {})",
            row.title, row.position, row.id
        );

        let threshold = row.id - self.retention_window;
        if threshold > 0 {
            let removed = queue::delete_older_than(&self.db, threshold).await?;
            if removed > 0 {
                debug!("Retention removed {} rows below id {}", removed, threshold);
            }
        }

        Ok(row)
    }

    /// Remove the row at `position`.
    ///
    /// The playing position cannot be removed by index; only advance moves
    /// the cursor. Absent rows are a rejected precondition, not a store error.
    pub async fn dequeue(&self, position: i64) -> Result<QueueRow> {
        if position == self.current_position {
            return Err(Error::InvalidOperation(
                "Cannot remove the item at the current position; skip it instead".to_string(),
            ));
        }

        queue::delete_at(&self.db, position)
            .await?
            .ok_or_else(|| Error::NotFound(format!("No queue item at position {}", position)))
    }

    /// The row at the cursor, if one exists
    pub async fn peek_current(&self) -> Result<Option<QueueRow>> {
        queue::find_by_position(&self.db, self.current_position).await
    }

    /// Rows at or after the cursor, ascending
    pub async fn list_upcoming(&self) -> Result<Vec<QueueRow>> {
        queue::list_from(&self.db, self.current_position).await
    }

    /// Rows before the cursor, descending
    pub async fn list_history(&self) -> Result<Vec<QueueRow>> {
        queue::list_before(&self.db, self.current_position).await
    }

    /// Move the cursor to the smallest position after it.
    ///
    /// With the loop flag set, the item being left behind is first
    /// re-enqueued as a fresh tail row (same media and submitter), so a
    /// looping queue never drains. Returns None and leaves the cursor
    /// untouched when no later position exists; the cursor is persisted only
    /// after the target row is confirmed.
    pub async fn advance(&mut self) -> Result<Option<QueueRow>> {
        if self.looping {
            if let Some(current) = self.peek_current().await? {
                let song = ResolvedSong {
                    media_url: current.media_url.clone(),
                    title: current.title.clone(),
                    artist: current.artist.clone(),
                    duration_secs: current.duration_secs,
                    thumbnail_url: current.thumbnail_url.clone(),
                };
                let tail = self.enqueue(&song, &current.submitter).await?;
                debug!(
                    "Loop re-enqueued {:?} at tail position {}",
                    tail.title, tail.position
                );
            }
        }

        let Some(next) = queue::find_next_after(&self.db, self.current_position).await? else {
            return Ok(None);
        };

        settings::save_cursor(&self.db, next.position).await?;
        self.current_position = next.position;
        debug!("Cursor advanced to position {}", next.position);

        Ok(Some(next))
    }

    /// Delete every row at or after the cursor; history is untouched.
    pub async fn clear_upcoming(&self) -> Result<u64> {
        queue::delete_range_from(&self.db, self.current_position).await
    }
}
