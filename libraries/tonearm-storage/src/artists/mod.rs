//! Artists vertical slice
//!
//! Artist rows are owned by the tracks slice; derived counts come from
//! aggregate queries.

use crate::Result;
use sqlx::{Row, SqlitePool};
use tonearm_core::Artist;

/// Get all artists with derived album/track counts
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<Artist>> {
    let rows = sqlx::query(
        "SELECT ar.id, ar.name,
                (SELECT COUNT(*) FROM albums a WHERE a.artist_id = ar.id) AS album_count,
                (SELECT COUNT(*) FROM tracks t WHERE t.artist_id = ar.id) AS track_count
         FROM artists ar
         ORDER BY ar.name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Artist {
            id: row.get("id"),
            name: row.get("name"),
            album_count: row.get("album_count"),
            track_count: row.get("track_count"),
        })
        .collect())
}

/// Find an artist by name (case-insensitive)
pub async fn find_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Artist>> {
    let row = sqlx::query(
        "SELECT ar.id, ar.name,
                (SELECT COUNT(*) FROM albums a WHERE a.artist_id = ar.id) AS album_count,
                (SELECT COUNT(*) FROM tracks t WHERE t.artist_id = ar.id) AS track_count
         FROM artists ar
         WHERE ar.name = ? COLLATE NOCASE",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| Artist {
        id: row.get("id"),
        name: row.get("name"),
        album_count: row.get("album_count"),
        track_count: row.get("track_count"),
    }))
}
