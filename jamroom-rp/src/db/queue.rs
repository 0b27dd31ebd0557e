//! Queue table access
//!
//! Ordered queue rows keyed by a strictly increasing position. Position
//! assignment happens inside a single INSERT so concurrent enqueues cannot
//! collide; ids are AUTOINCREMENT and never reused, which the retention
//! window relies on.

use crate::error::Result;
use crate::resolver::ResolvedSong;
use jamroom_common::events::QueueItemInfo;
use sqlx::{Pool, Sqlite};

const ROW_COLUMNS: &str =
    "id, position, submitter, media_url, title, artist, duration_secs, thumbnail_url";

/// One stored queue row
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct QueueRow {
    pub id: i64,
    pub position: i64,
    pub submitter: String,
    pub media_url: String,
    pub title: String,
    pub artist: String,
    pub duration_secs: i64,
    pub thumbnail_url: Option<String>,
}

impl From<QueueRow> for QueueItemInfo {
    fn from(row: QueueRow) -> Self {
        QueueItemInfo {
            id: row.id,
            position: row.position,
            submitter: row.submitter,
            title: row.title,
            artist: row.artist,
            duration_secs: row.duration_secs,
            media_url: row.media_url,
            thumbnail_url: row.thumbnail_url,
        }
    }
}

/// Append a resolved song to the tail of the queue.
///
/// The new position is `max(position) + 1` (0 on an empty table), floored at
/// `position_floor` so a row can never land behind the cursor after the
/// upcoming range has been cleared. Computed and inserted in one statement.
pub async fn append(
    db: &Pool<Sqlite>,
    song: &ResolvedSong,
    submitter: &str,
    position_floor: i64,
) -> Result<QueueRow> {
    let row = sqlx::query_as::<_, QueueRow>(&format!(
        r#"
        INSERT INTO queue (position, submitter, media_url, title, artist, duration_secs, thumbnail_url)
        VALUES (
            MAX(COALESCE((SELECT MAX(position) + 1 FROM queue), 0), ?),
            ?, ?, ?, ?, ?, ?
        )
        RETURNING {ROW_COLUMNS}
        "#
    ))
    .bind(position_floor)
    .bind(submitter)
    .bind(&song.media_url)
    .bind(&song.title)
    .bind(&song.artist)
    .bind(song.duration_secs)
    .bind(&song.thumbnail_url)
    .fetch_one(db)
    .await?;

    Ok(row)
}

/// Delete the row at `position`, returning it if it existed
pub async fn delete_at(db: &Pool<Sqlite>, position: i64) -> Result<Option<QueueRow>> {
    let row = sqlx::query_as::<_, QueueRow>(&format!(
        "DELETE FROM queue WHERE position = ? RETURNING {ROW_COLUMNS}"
    ))
    .bind(position)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

/// Delete every row at or after `from_position`; returns rows removed
pub async fn delete_range_from(db: &Pool<Sqlite>, from_position: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM queue WHERE position >= ?")
        .bind(from_position)
        .execute(db)
        .await?;

    Ok(result.rows_affected())
}

/// Delete every row with an id below `id_threshold`; returns rows removed
pub async fn delete_older_than(db: &Pool<Sqlite>, id_threshold: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM queue WHERE id < ?")
        .bind(id_threshold)
        .execute(db)
        .await?;

    Ok(result.rows_affected())
}

/// Fetch the row at `position`
pub async fn find_by_position(db: &Pool<Sqlite>, position: i64) -> Result<Option<QueueRow>> {
    let row = sqlx::query_as::<_, QueueRow>(&format!(
        "SELECT {ROW_COLUMNS} FROM queue WHERE position = ?"
    ))
    .bind(position)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

/// Fetch the row at the smallest position strictly greater than `position`
pub async fn find_next_after(db: &Pool<Sqlite>, position: i64) -> Result<Option<QueueRow>> {
    let row = sqlx::query_as::<_, QueueRow>(&format!(
        "SELECT {ROW_COLUMNS} FROM queue WHERE position > ? ORDER BY position LIMIT 1"
    ))
    .bind(position)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

/// All rows at or after `position`, ascending
pub async fn list_from(db: &Pool<Sqlite>, position: i64) -> Result<Vec<QueueRow>> {
    let rows = sqlx::query_as::<_, QueueRow>(&format!(
        "SELECT {ROW_COLUMNS} FROM queue WHERE position >= ? ORDER BY position"
    ))
    .bind(position)
    .fetch_all(db)
    .await?;

    Ok(rows)
}

/// All rows before `position`, descending (most recently played first)
pub async fn list_before(db: &Pool<Sqlite>, position: i64) -> Result<Vec<QueueRow>> {
    let rows = sqlx::query_as::<_, QueueRow>(&format!(
        "SELECT {ROW_COLUMNS} FROM queue WHERE position < ? ORDER BY position DESC"
    ))
    .bind(position)
    .fetch_all(db)
    .await?;

    Ok(rows)
}
