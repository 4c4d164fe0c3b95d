/// Track domain type
use crate::types::{AlbumId, ArtistId, TrackId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// An indexed audio track
///
/// `file_path` is unique across the library; a file is indexed at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier
    pub id: TrackId,

    /// Track title (falls back to the file stem when the tag is missing)
    pub title: String,

    /// Primary artist display name
    pub artist: Option<String>,

    /// Album name
    pub album: Option<String>,

    /// Genre
    pub genre: Option<String>,

    /// Track number within the album
    pub track_number: Option<u32>,

    /// Duration in milliseconds
    pub duration_ms: Option<i64>,

    /// File format (lowercased extension, e.g. "flac")
    pub format: String,

    /// Absolute file path on disk
    pub file_path: PathBuf,

    /// File size in bytes at index time
    pub file_size: i64,

    /// File modification time (unix seconds) at index time
    pub file_mtime: i64,

    /// SHA-256 content hash, when computed
    pub content_hash: Option<String>,

    /// Resolved artist row
    pub artist_id: Option<ArtistId>,

    /// Resolved album row
    pub album_id: Option<AlbumId>,

    /// Unix timestamp of first indexing
    pub created_at: i64,

    /// Unix timestamp of the last metadata refresh
    pub updated_at: i64,
}

impl Track {
    /// Get the track duration as a `Duration`
    pub fn duration(&self) -> Option<Duration> {
        self.duration_ms
            .filter(|ms| *ms >= 0)
            .map(|ms| Duration::from_millis(ms as u64))
    }
}

/// Metadata extracted from a single audio file
///
/// Produced by the extractor, consumed by the store's upsert. Optional tags
/// that are absent stay `None`; only the title is required and already has
/// its filename fallback applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    /// Track title (never empty; filename fallback applied by the extractor)
    pub title: String,

    /// Primary artist name
    pub artist: Option<String>,

    /// Album artist, when it differs from the track artist
    pub album_artist: Option<String>,

    /// Album name
    pub album: Option<String>,

    /// Genre
    pub genre: Option<String>,

    /// Track number
    pub track_number: Option<u32>,

    /// Duration in milliseconds
    pub duration_ms: Option<i64>,

    /// Lowercased file extension
    pub format: String,

    /// Absolute file path
    pub file_path: PathBuf,

    /// File size in bytes
    pub file_size: i64,

    /// File modification time (unix seconds)
    pub file_mtime: i64,

    /// SHA-256 content hash, when computed
    pub content_hash: Option<String>,
}

impl TrackMetadata {
    /// The artist the album should be grouped under
    ///
    /// Falls back to the track artist when no album artist tag is present.
    pub fn album_artist_or_artist(&self) -> Option<&str> {
        self.album_artist
            .as_deref()
            .or_else(|| self.artist.as_deref())
    }

    /// Derive a title from a file path (stem without extension)
    pub fn title_from_path(path: &Path) -> String {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Unknown")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_from_path_strips_extension() {
        assert_eq!(
            TrackMetadata::title_from_path(Path::new("/music/01 - Song.flac")),
            "01 - Song"
        );
        assert_eq!(TrackMetadata::title_from_path(Path::new("song")), "song");
    }

    #[test]
    fn album_artist_falls_back_to_artist() {
        let meta = TrackMetadata {
            title: "T".to_string(),
            artist: Some("X".to_string()),
            album_artist: None,
            album: Some("Y".to_string()),
            genre: None,
            track_number: None,
            duration_ms: None,
            format: "mp3".to_string(),
            file_path: PathBuf::from("/music/t.mp3"),
            file_size: 0,
            file_mtime: 0,
            content_hash: None,
        };
        assert_eq!(meta.album_artist_or_artist(), Some("X"));
    }
}
