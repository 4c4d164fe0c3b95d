/// Artist domain type
use crate::types::ArtistId;
use serde::{Deserialize, Serialize};

/// An artist, created implicitly by the first track that references it
///
/// Identity is the normalized name; cascade-deleted with its last track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    /// Unique artist identifier
    pub id: ArtistId,

    /// Artist name (trimmed, case preserved)
    pub name: String,

    /// Number of albums credited to this artist (derived)
    pub album_count: i64,

    /// Number of tracks by this artist (derived)
    pub track_count: i64,
}

/// Normalize an artist name for identity comparison
///
/// Trims and collapses internal whitespace; case is preserved for display
/// but lookups are case-insensitive at the storage layer.
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
