//! Tonearm Metadata
//!
//! Tag extraction for the library indexer.
//!
//! This crate reads container-level metadata (tags, duration, file facts)
//! from audio files without decoding audio. It produces a
//! [`tonearm_core::TrackMetadata`] record or a typed [`ExtractError`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let meta = tonearm_metadata::extract(Path::new("/music/song.flac"), true)?;
//! println!("{} by {:?}", meta.title, meta.artist);
//! # Ok(())
//! # }
//! ```

mod error;
mod extractor;

pub use error::{ExtractError, Result};
pub use extractor::{content_hash, extract};
