//! Albums vertical slice
//!
//! Album rows are owned by the tracks slice (created on first reference,
//! cascade-deleted with their last track); this slice only reads them.
//! `track_count` is derived by aggregate query, never stored.

use crate::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tonearm_core::{Album, AlbumId};

fn map_album(row: &SqliteRow) -> Album {
    Album {
        id: row.get("id"),
        name: row.get("name"),
        artist_id: row.get("artist_id"),
        artist: row.get("artist_name"),
        cover_art_path: row.get("cover_art_path"),
        track_count: row.get("track_count"),
    }
}

/// Get all albums with their derived track counts
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<Album>> {
    let rows = sqlx::query(
        "SELECT a.id, a.name, a.artist_id, a.cover_art_path,
                ar.name AS artist_name,
                COUNT(t.id) AS track_count
         FROM albums a
         LEFT JOIN artists ar ON a.artist_id = ar.id
         LEFT JOIN tracks t ON t.album_id = a.id
         GROUP BY a.id
         ORDER BY a.name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_album).collect())
}

/// Find an album by its `(name, artist)` composite identity
pub async fn find(
    pool: &SqlitePool,
    name: &str,
    artist: Option<&str>,
) -> Result<Option<Album>> {
    let row = match artist {
        Some(artist) => {
            sqlx::query(
                "SELECT a.id, a.name, a.artist_id, a.cover_art_path,
                        ar.name AS artist_name,
                        COUNT(t.id) AS track_count
                 FROM albums a
                 LEFT JOIN artists ar ON a.artist_id = ar.id
                 LEFT JOIN tracks t ON t.album_id = a.id
                 WHERE a.name = ? COLLATE NOCASE AND ar.name = ? COLLATE NOCASE
                 GROUP BY a.id",
            )
            .bind(name)
            .bind(artist)
            .fetch_optional(pool)
            .await?
        }
        None => {
            sqlx::query(
                "SELECT a.id, a.name, a.artist_id, a.cover_art_path,
                        ar.name AS artist_name,
                        COUNT(t.id) AS track_count
                 FROM albums a
                 LEFT JOIN artists ar ON a.artist_id = ar.id
                 LEFT JOIN tracks t ON t.album_id = a.id
                 WHERE a.name = ? COLLATE NOCASE AND a.artist_id IS NULL
                 GROUP BY a.id",
            )
            .bind(name)
            .fetch_optional(pool)
            .await?
        }
    };

    Ok(row.as_ref().map(map_album))
}

/// Set the cached artwork reference for an album
pub async fn set_cover_art(pool: &SqlitePool, id: AlbumId, path: Option<&str>) -> Result<()> {
    sqlx::query("UPDATE albums SET cover_art_path = ? WHERE id = ?")
        .bind(path)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}
