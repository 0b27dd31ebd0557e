//! Settings database access
//!
//! Read/write settings from the settings table (key-value store).
//! The playback cursor lives here: it is the one piece of room state that
//! must survive a process restart.

use crate::error::{Error, Result};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

const CURSOR_KEY: &str = "queue_current_position";

/// Load the persisted playback cursor (0 when never set)
pub async fn load_cursor(db: &Pool<Sqlite>) -> Result<i64> {
    match get_setting::<i64>(db, CURSOR_KEY).await? {
        Some(position) => Ok(position),
        None => {
            save_cursor(db, 0).await?;
            Ok(0)
        }
    }
}

/// Persist the playback cursor
pub async fn save_cursor(db: &Pool<Sqlite>, position: i64) -> Result<()> {
    set_setting(db, CURSOR_KEY, position).await
}

/// Load the queue retention window (how many newest item ids to keep)
///
/// # Returns
/// Window size in ids (default: 100 if not set), clamped to 10-10000
pub async fn load_retention_window(db: &Pool<Sqlite>) -> Result<i64> {
    match get_setting::<i64>(db, "queue_retention_window").await? {
        Some(window) => Ok(window.clamp(10, 10_000)),
        None => Ok(100),
    }
}

/// Load the transport disconnect grace interval
///
/// # Returns
/// Grace interval in milliseconds (default: 5000ms if not set),
/// clamped to 500-30000ms
pub async fn load_disconnect_grace_ms(db: &Pool<Sqlite>) -> Result<u64> {
    match get_setting::<u64>(db, "disconnect_grace_ms").await? {
        Some(grace_ms) => Ok(grace_ms.clamp(500, 30_000)),
        None => Ok(5000),
    }
}

/// Generic setting getter
///
/// Returns None if key doesn't exist in database.
/// Parses value from string using FromStr trait.
pub async fn get_setting<T: FromStr>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;

    match value {
        Some(s) => match s.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(Error::Config(format!(
                "Failed to parse setting '{}' value: {}",
                key, s
            ))),
        },
        None => Ok(None),
    }
}

/// Generic setting setter
///
/// Inserts or updates setting in database.
pub async fn set_setting<T: ToString>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()> {
    let value_str = value.to_string();

    sqlx::query(
        r#"
        INSERT INTO settings (key, value)
        VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(value_str)
    .execute(db)
    .await?;

    Ok(())
}
