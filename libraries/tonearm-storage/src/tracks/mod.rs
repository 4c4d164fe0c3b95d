//! Tracks vertical slice
//!
//! Owns the upsert algorithm: resolve-or-create the album and artist rows,
//! insert or update the track, and cascade-delete albums/artists left with
//! zero tracks after any removal. All mutations run inside one transaction.

use crate::{Result, StorageError};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool, Transaction};
use std::path::{Path, PathBuf};
use tonearm_core::{normalize_name, Track, TrackId, TrackMetadata};

/// Outcome of `upsert` for a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// File was not indexed before; a new track row was inserted
    Inserted,
    /// File changed on disk; the row was refreshed and re-linked
    Updated,
    /// File unchanged (same size and mtime); no write was performed
    Unchanged,
}

/// File-level facts about an indexed track, used for scan reconciliation
#[derive(Debug, Clone)]
pub struct TrackFileInfo {
    pub id: TrackId,
    pub file_path: PathBuf,
    pub file_size: i64,
    pub file_mtime: i64,
}

const TRACK_COLUMNS: &str = "
    t.id, t.title, t.genre, t.track_number, t.duration_ms, t.format,
    t.file_path, t.file_size, t.file_mtime, t.content_hash,
    t.artist_id, t.album_id, t.created_at, t.updated_at,
    ar.name AS artist_name,
    al.name AS album_name";

const TRACK_JOINS: &str = "
    FROM tracks t
    LEFT JOIN artists ar ON t.artist_id = ar.id
    LEFT JOIN albums al ON t.album_id = al.id";

fn map_track(row: &SqliteRow) -> Track {
    Track {
        id: row.get("id"),
        title: row.get("title"),
        artist: row.get("artist_name"),
        album: row.get("album_name"),
        genre: row.get("genre"),
        track_number: row.get::<Option<i64>, _>("track_number").map(|n| n as u32),
        duration_ms: row.get("duration_ms"),
        format: row.get("format"),
        file_path: PathBuf::from(row.get::<String, _>("file_path")),
        file_size: row.get("file_size"),
        file_mtime: row.get("file_mtime"),
        content_hash: row.get("content_hash"),
        artist_id: row.get("artist_id"),
        album_id: row.get("album_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Get all tracks with denormalized artist/album names
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<Track>> {
    let rows = sqlx::query(&format!(
        "SELECT {TRACK_COLUMNS} {TRACK_JOINS} ORDER BY t.title"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_track).collect())
}

/// Get a track by its file path
pub async fn get_by_path(pool: &SqlitePool, path: &Path) -> Result<Option<Track>> {
    let row = sqlx::query(&format!(
        "SELECT {TRACK_COLUMNS} {TRACK_JOINS} WHERE t.file_path = ?"
    ))
    .bind(path.display().to_string())
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(map_track))
}

/// Get a track by ID
pub async fn get_by_id(pool: &SqlitePool, id: TrackId) -> Result<Option<Track>> {
    let row = sqlx::query(&format!(
        "SELECT {TRACK_COLUMNS} {TRACK_JOINS} WHERE t.id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(map_track))
}

/// Get tracks on an album identified by `(name, artist)`
pub async fn get_by_album(
    pool: &SqlitePool,
    album_name: &str,
    album_artist: Option<&str>,
) -> Result<Vec<Track>> {
    let rows = match album_artist {
        Some(artist) => {
            sqlx::query(&format!(
                "SELECT {TRACK_COLUMNS} {TRACK_JOINS}
                 LEFT JOIN artists aar ON al.artist_id = aar.id
                 WHERE al.name = ? COLLATE NOCASE AND aar.name = ? COLLATE NOCASE
                 ORDER BY t.track_number, t.title"
            ))
            .bind(album_name)
            .bind(artist)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(&format!(
                "SELECT {TRACK_COLUMNS} {TRACK_JOINS}
                 WHERE al.name = ? COLLATE NOCASE AND al.artist_id IS NULL
                 ORDER BY t.track_number, t.title"
            ))
            .bind(album_name)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows.iter().map(map_track).collect())
}

/// Get tracks by artist name
pub async fn get_by_artist(pool: &SqlitePool, artist_name: &str) -> Result<Vec<Track>> {
    let rows = sqlx::query(&format!(
        "SELECT {TRACK_COLUMNS} {TRACK_JOINS}
         WHERE ar.name = ? COLLATE NOCASE
         ORDER BY al.name, t.track_number, t.title"
    ))
    .bind(artist_name)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_track).collect())
}

/// Search tracks by title, artist name or album name
pub async fn search(pool: &SqlitePool, query: &str) -> Result<Vec<Track>> {
    let pattern = format!("%{}%", query);

    let rows = sqlx::query(&format!(
        "SELECT {TRACK_COLUMNS} {TRACK_JOINS}
         WHERE t.title LIKE ? OR ar.name LIKE ? OR al.name LIKE ?
         ORDER BY t.title"
    ))
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_track).collect())
}

/// File facts for every track whose path lies under `dir`
pub async fn file_info_under_directory(
    pool: &SqlitePool,
    dir: &Path,
) -> Result<Vec<TrackFileInfo>> {
    let rows = sqlx::query(
        "SELECT id, file_path, file_size, file_mtime FROM tracks
         WHERE file_path LIKE ? ESCAPE '\\'",
    )
    .bind(like_prefix(dir))
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| TrackFileInfo {
            id: row.get("id"),
            file_path: PathBuf::from(row.get::<String, _>("file_path")),
            file_size: row.get("file_size"),
            file_mtime: row.get("file_mtime"),
        })
        .collect())
}

/// Insert or update the track for a file, keyed on `file_path`
///
/// An existing row with unchanged size and mtime is a no-op, which keeps
/// repeated scans cheap and idempotent. A changed file is refreshed in place
/// and its album/artist links re-resolved; rows orphaned by the re-link are
/// swept before the transaction commits.
pub async fn upsert(pool: &SqlitePool, meta: &TrackMetadata) -> Result<(TrackId, UpsertOutcome)> {
    let path_str = meta.file_path.display().to_string();
    let mut tx = pool.begin().await?;

    let existing = sqlx::query(
        "SELECT id, file_size, file_mtime FROM tracks WHERE file_path = ?",
    )
    .bind(&path_str)
    .fetch_optional(&mut *tx)
    .await?;

    if let Some(row) = existing {
        let id: TrackId = row.get("id");
        let unchanged = row.get::<i64, _>("file_size") == meta.file_size
            && row.get::<i64, _>("file_mtime") == meta.file_mtime;
        if unchanged {
            return Ok((id, UpsertOutcome::Unchanged));
        }

        let (artist_id, album_id) = resolve_links(&mut tx, meta).await?;
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            "UPDATE tracks
             SET title = ?, artist_id = ?, album_id = ?, genre = ?,
                 track_number = ?, duration_ms = ?, format = ?,
                 file_size = ?, file_mtime = ?, content_hash = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&meta.title)
        .bind(artist_id)
        .bind(album_id)
        .bind(&meta.genre)
        .bind(meta.track_number.map(|n| n as i64))
        .bind(meta.duration_ms)
        .bind(&meta.format)
        .bind(meta.file_size)
        .bind(meta.file_mtime)
        .bind(&meta.content_hash)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        // The re-link may have orphaned the previous album/artist
        sweep_orphans(&mut tx).await?;
        tx.commit().await?;
        return Ok((id, UpsertOutcome::Updated));
    }

    let (artist_id, album_id) = resolve_links(&mut tx, meta).await?;

    let result = sqlx::query(
        "INSERT INTO tracks (
             title, artist_id, album_id, genre, track_number, duration_ms,
             format, file_path, file_size, file_mtime, content_hash
         ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&meta.title)
    .bind(artist_id)
    .bind(album_id)
    .bind(&meta.genre)
    .bind(meta.track_number.map(|n| n as i64))
    .bind(meta.duration_ms)
    .bind(&meta.format)
    .bind(&path_str)
    .bind(meta.file_size)
    .bind(meta.file_mtime)
    .bind(&meta.content_hash)
    .execute(&mut *tx)
    .await?;

    let id = result.last_insert_rowid();
    tx.commit().await?;
    Ok((id, UpsertOutcome::Inserted))
}

/// Remove the track at `path`, cascading album/artist cleanup
///
/// Returns `true` when a row was removed.
pub async fn remove_by_path(pool: &SqlitePool, path: &Path) -> Result<bool> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query("DELETE FROM tracks WHERE file_path = ?")
        .bind(path.display().to_string())
        .execute(&mut *tx)
        .await?;

    let removed = result.rows_affected() > 0;
    if removed {
        sweep_orphans(&mut tx).await?;
    }
    tx.commit().await?;

    Ok(removed)
}

/// Remove a track by ID, cascading album/artist cleanup
pub async fn remove_by_id(pool: &SqlitePool, id: TrackId) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM tracks WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sweep_orphans(&mut tx).await?;
    tx.commit().await?;

    Ok(())
}

/// Remove every track whose path lies under `dir`, cascading cleanup
///
/// Returns the number of tracks removed.
pub async fn remove_under_directory(pool: &SqlitePool, dir: &Path) -> Result<u64> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query("DELETE FROM tracks WHERE file_path LIKE ? ESCAPE '\\'")
        .bind(like_prefix(dir))
        .execute(&mut *tx)
        .await?;

    let removed = result.rows_affected();
    if removed > 0 {
        sweep_orphans(&mut tx).await?;
    }
    tx.commit().await?;

    tracing::debug!("removed {} tracks under {}", removed, dir.display());
    Ok(removed)
}

/// Resolve or create the artist and album rows for a track's metadata
async fn resolve_links(
    tx: &mut Transaction<'_, sqlx::Sqlite>,
    meta: &TrackMetadata,
) -> Result<(Option<i64>, Option<i64>)> {
    let artist_id = match meta.artist.as_deref() {
        Some(name) => Some(find_or_create_artist(tx, name).await?),
        None => None,
    };

    // Albums group under the album artist when tagged, the track artist
    // otherwise, so two tracks of a compilation share one row.
    let album_artist_id = match meta.album_artist.as_deref() {
        Some(name) if meta.artist.as_deref() != Some(name) => {
            Some(find_or_create_artist(tx, name).await?)
        }
        Some(_) => artist_id,
        None => artist_id,
    };

    let album_id = match meta.album.as_deref() {
        Some(name) => Some(find_or_create_album(tx, name, album_artist_id).await?),
        None => None,
    };

    Ok((artist_id, album_id))
}

async fn find_or_create_artist(
    tx: &mut Transaction<'_, sqlx::Sqlite>,
    raw_name: &str,
) -> Result<i64> {
    let name = normalize_name(raw_name);
    if name.is_empty() {
        return Err(StorageError::not_found("Artist", raw_name));
    }

    let existing = sqlx::query("SELECT id FROM artists WHERE name = ? COLLATE NOCASE")
        .bind(&name)
        .fetch_optional(&mut **tx)
        .await?;

    if let Some(row) = existing {
        return Ok(row.get("id"));
    }

    let result = sqlx::query("INSERT INTO artists (name) VALUES (?)")
        .bind(&name)
        .execute(&mut **tx)
        .await?;

    Ok(result.last_insert_rowid())
}

async fn find_or_create_album(
    tx: &mut Transaction<'_, sqlx::Sqlite>,
    name: &str,
    artist_id: Option<i64>,
) -> Result<i64> {
    let existing = match artist_id {
        Some(artist_id) => {
            sqlx::query("SELECT id FROM albums WHERE name = ? COLLATE NOCASE AND artist_id = ?")
                .bind(name)
                .bind(artist_id)
                .fetch_optional(&mut **tx)
                .await?
        }
        None => {
            sqlx::query("SELECT id FROM albums WHERE name = ? COLLATE NOCASE AND artist_id IS NULL")
                .bind(name)
                .fetch_optional(&mut **tx)
                .await?
        }
    };

    if let Some(row) = existing {
        return Ok(row.get("id"));
    }

    let result = sqlx::query("INSERT INTO albums (name, artist_id) VALUES (?, ?)")
        .bind(name)
        .bind(artist_id)
        .execute(&mut **tx)
        .await?;

    Ok(result.last_insert_rowid())
}

/// Delete albums with no remaining tracks, then artists referenced by
/// neither a track nor a surviving album
async fn sweep_orphans(tx: &mut Transaction<'_, sqlx::Sqlite>) -> Result<()> {
    sqlx::query(
        "DELETE FROM albums WHERE id NOT IN
             (SELECT DISTINCT album_id FROM tracks WHERE album_id IS NOT NULL)",
    )
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        "DELETE FROM artists WHERE id NOT IN
             (SELECT DISTINCT artist_id FROM tracks WHERE artist_id IS NOT NULL)
         AND id NOT IN
             (SELECT DISTINCT artist_id FROM albums WHERE artist_id IS NOT NULL)",
    )
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Build a `LIKE` prefix pattern for paths under `dir`, escaping wildcards
fn like_prefix(dir: &Path) -> String {
    let mut prefix = dir.display().to_string();
    prefix = prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    if !prefix.ends_with(std::path::MAIN_SEPARATOR) {
        prefix.push(std::path::MAIN_SEPARATOR);
    }
    prefix.push('%');
    prefix
}
