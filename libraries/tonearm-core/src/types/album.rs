/// Album domain type
use crate::types::{AlbumId, ArtistId};
use serde::{Deserialize, Serialize};

/// An album, created implicitly by the first track that references it
///
/// Identity is the `(name, artist)` composite; the row is cascade-deleted
/// when its last track is removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    /// Unique album identifier
    pub id: AlbumId,

    /// Album title
    pub name: String,

    /// Album artist row, when known
    pub artist_id: Option<ArtistId>,

    /// Album artist display name
    pub artist: Option<String>,

    /// Cached artwork reference for the UI layer
    pub cover_art_path: Option<String>,

    /// Number of tracks currently on the album (derived)
    pub track_count: i64,
}
