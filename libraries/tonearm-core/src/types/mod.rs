//! Domain types for the library index

mod album;
mod artist;
mod event;
mod scan;
mod settings;
mod track;

pub use album::Album;
pub use artist::{normalize_name, Artist};
pub use event::{ScanEvent, EVENT_ERROR_CAP};
pub use scan::{ScanProgress, ScanReport};
pub use settings::{LibrarySettings, SettingsUpdate};
pub use track::{Track, TrackMetadata};

/// Surrogate track identifier (SQLite rowid)
pub type TrackId = i64;

/// Surrogate album identifier
pub type AlbumId = i64;

/// Surrogate artist identifier
pub type ArtistId = i64;

/// Aggregate statistics over the whole library
///
/// Always derived from the current track rows, never cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LibraryStats {
    /// Total number of indexed tracks
    pub total_tracks: i64,

    /// Total number of albums
    pub total_albums: i64,

    /// Total number of artists
    pub total_artists: i64,

    /// Summed duration of all tracks in milliseconds
    pub total_duration_ms: i64,
}
