//! Metadata extraction from audio files
//!
//! Container/tag-level parsing only; no audio is decoded. Duration and the
//! tag set come from lofty's probe, file facts from `std::fs::metadata`.

use crate::{ExtractError, Result};
use lofty::{Accessor, AudioFile, Probe, TaggedFileExt};
use std::path::Path;
use std::time::UNIX_EPOCH;
use tonearm_core::TrackMetadata;

/// Extract metadata from a single audio file
///
/// Absence of optional tags (artist, album, genre, track number) is not a
/// failure. A missing title falls back to the file stem. `with_hash`
/// additionally computes a streaming SHA-256 of the file contents.
pub fn extract(path: &Path, with_hash: bool) -> Result<TrackMetadata> {
    if !path.exists() {
        return Err(ExtractError::FileNotFound(path.display().to_string()));
    }

    let fs_meta = std::fs::metadata(path).map_err(|e| ExtractError::Unreadable {
        path: path.display().to_string(),
        source: e,
    })?;
    let file_size = fs_meta.len() as i64;
    let file_mtime = fs_meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);

    let tagged_file = Probe::open(path)
        .map_err(|e| ExtractError::UnsupportedContainer {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?
        .read()
        .map_err(|e| ExtractError::UnsupportedContainer {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    // Prefer the container's primary tag (ID3v2 for MP3, Vorbis for FLAC/OGG)
    let tag = tagged_file.primary_tag().or_else(|| tagged_file.first_tag());

    let duration_ms = tagged_file.properties().duration().as_millis() as i64;

    let (title, artist, album, album_artist, genre, track_number) = if let Some(tag) = tag {
        (
            tag.title().map(|s| s.to_string()),
            tag.artist().map(|s| s.to_string()),
            tag.album().map(|s| s.to_string()),
            tag.get_string(&lofty::ItemKey::AlbumArtist)
                .map(|s| s.to_string()),
            tag.genre().map(|s| s.to_string()),
            tag.track(),
        )
    } else {
        (None, None, None, None, None, None)
    };

    let title = title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| TrackMetadata::title_from_path(path));

    let format = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_else(|| "unknown".to_string());

    let content_hash = if with_hash {
        Some(content_hash(path)?)
    } else {
        None
    };

    tracing::debug!(
        "extracted {}: title={:?} artist={:?} album={:?}",
        path.display(),
        title,
        artist,
        album
    );

    Ok(TrackMetadata {
        title,
        artist,
        album_artist,
        album,
        genre,
        track_number,
        duration_ms: Some(duration_ms),
        format,
        file_path: path.to_path_buf(),
        file_size,
        file_mtime,
        content_hash,
    })
}

/// Calculate the SHA-256 hash of a file's contents
pub fn content_hash(path: &Path) -> Result<String> {
    use sha2::{Digest, Sha256};
    use std::io::Read;

    let mut file = std::fs::File::open(path).map_err(|e| ExtractError::Unreadable {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(|e| ExtractError::Unreadable {
            path: path.display().to_string(),
            source: e,
        })?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}
