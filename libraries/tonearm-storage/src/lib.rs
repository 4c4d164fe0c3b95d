//! Tonearm Storage
//!
//! SQLite persistence layer for the library index.
//!
//! This crate owns the normalized database of tracks, albums and artists and
//! guards its referential integrity: every album/artist row exists because a
//! track references it, and removal of the last track cascades.
//!
//! # Architecture
//!
//! - **Vertical slicing**: each feature owns its own queries and logic
//! - **Single-writer discipline**: every mutation runs inside one
//!   transaction; readers never observe a partially-updated row
//! - **Derived aggregates**: counts and stats come from aggregate queries,
//!   so they cannot drift from the track rows
//!
//! # Example
//!
//! ```rust,no_run
//! use tonearm_storage::{create_pool, run_migrations};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool("sqlite://library.db").await?;
//! run_migrations(&pool).await?;
//!
//! let tracks = tonearm_storage::tracks::get_all(&pool).await?;
//! # Ok(())
//! # }
//! ```

mod error;

// Vertical slices
pub mod albums;
pub mod artists;
pub mod settings;
pub mod stats;
pub mod tracks;

pub use error::{Result, StorageError};

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;

// Embed migrations into the binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// Called once when the engine opens to ensure the schema is up to date.
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| StorageError::Migration(e.to_string()))
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g. `sqlite://library.db`)
///
/// # Errors
///
/// Returns an error if the connection fails
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal) // readers stay concurrent with the single writer
        .foreign_keys(true)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    tracing::debug!("opened sqlite pool at {}", database_url);

    Ok(pool)
}
