//! Tonearm Indexer
//!
//! Scans configured directories for audio files, extracts their metadata,
//! and keeps the library store in sync with the filesystem. The [`Engine`]
//! is the single entry point: it owns the database pool, the scan
//! orchestrator, and the change watcher, and exposes commands, queries,
//! and a broadcast event stream.
//!
//! # Example
//!
//! ```no_run
//! use tonearm_indexer::{Engine, EngineConfig};
//!
//! # async fn run() -> tonearm_indexer::Result<()> {
//! let engine = Engine::open(EngineConfig::new("sqlite://library.db")).await?;
//! engine.add_directory(std::path::Path::new("/home/me/Music")).await?;
//! let report = engine.scan().await?;
//! println!("{} new tracks", report.new_tracks);
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod matcher;
pub mod orchestrator;
pub mod scanner;
pub mod watcher;

pub use engine::{Engine, EngineConfig};
pub use error::{IndexError, Result};
pub use matcher::{MatchDecision, PathMatcher};
pub use orchestrator::ScanOrchestrator;
pub use scanner::DirectoryScanner;
pub use watcher::{LibraryWatcher, WatchEvent};
