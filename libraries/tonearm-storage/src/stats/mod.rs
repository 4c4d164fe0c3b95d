//! Aggregate library statistics
//!
//! Stats are computed from the current rows on every call, so they are
//! consistent with the track table by construction.

use crate::Result;
use sqlx::{Row, SqlitePool};
use tonearm_core::LibraryStats;

/// Compute aggregate statistics over the whole library
pub async fn get(pool: &SqlitePool) -> Result<LibraryStats> {
    let row = sqlx::query(
        "SELECT
            (SELECT COUNT(*) FROM tracks) AS total_tracks,
            (SELECT COUNT(*) FROM albums) AS total_albums,
            (SELECT COUNT(*) FROM artists) AS total_artists,
            (SELECT COALESCE(SUM(duration_ms), 0) FROM tracks) AS total_duration_ms",
    )
    .fetch_one(pool)
    .await?;

    Ok(LibraryStats {
        total_tracks: row.get("total_tracks"),
        total_albums: row.get("total_albums"),
        total_artists: row.get("total_artists"),
        total_duration_ms: row.get("total_duration_ms"),
    })
}
