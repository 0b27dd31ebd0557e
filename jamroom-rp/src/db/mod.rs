//! Queue store access
//!
//! SQLite-backed persistence: the `queue` table of ordered items and the
//! `settings` key-value table holding the playback cursor and tunables.

pub mod init;
pub mod queue;
pub mod settings;

use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::info;

/// Open (creating if missing) the room database and prepare the schema.
pub async fn connect(path: &Path) -> Result<Pool<Sqlite>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    info!("Opened room database at {}", path.display());

    init::create_schema(&pool).await?;
    init::init_settings_defaults(&pool).await?;

    Ok(pool)
}
