//! Library engine facade
//!
//! Single entry point tying the store, extractor, orchestrator and watcher
//! together. Applications hold one [`Engine`], issue commands and queries
//! through it, and subscribe to its event stream for UI updates.

use crate::orchestrator::ScanOrchestrator;
use crate::watcher::{LibraryWatcher, WatchEvent};
use crate::{IndexError, Result};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc, RwLock};
use tonearm_core::{
    Album, Artist, LibrarySettings, LibraryStats, ScanEvent, ScanProgress, ScanReport,
    SettingsUpdate, Track, TrackId,
};
use tonearm_storage::{albums, artists, settings as settings_store, stats, tracks};
use tracing::{debug, error, info, warn};

/// Engine construction parameters
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// SQLite connection URL, e.g. `sqlite:///home/me/.local/share/tonearm/library.db`
    pub database_url: String,
    /// Parallelism of the metadata extraction stage
    pub extraction_workers: usize,
}

impl EngineConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            extraction_workers: num_cpus::get().min(8),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.extraction_workers = workers.max(1);
        self
    }
}

/// The library indexing engine
///
/// Cheap to clone; all clones share the same pool, settings, and event
/// stream.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    pool: SqlitePool,
    settings: RwLock<LibrarySettings>,
    orchestrator: ScanOrchestrator,
    watcher: LibraryWatcher,
    /// Claimed by `start`, exactly once
    watch_rx: Mutex<Option<mpsc::Receiver<(PathBuf, WatchEvent)>>>,
    events: broadcast::Sender<ScanEvent>,
}

impl Engine {
    /// Open (or create) the library database and load persisted settings
    pub async fn open(config: EngineConfig) -> Result<Self> {
        let pool = tonearm_storage::create_pool(&config.database_url).await?;
        tonearm_storage::run_migrations(&pool).await?;

        let settings = settings_store::load(&pool).await?;
        debug!(
            "loaded settings: {} directories, {} formats",
            settings.music_directories.len(),
            settings.supported_formats.len()
        );

        let (events, _) = broadcast::channel(256);
        let orchestrator = ScanOrchestrator::new(pool.clone(), events.clone())
            .with_workers(config.extraction_workers);

        let mut watcher = LibraryWatcher::new();
        let watch_rx = watcher.take_event_receiver();

        Ok(Self {
            inner: Arc::new(EngineInner {
                pool,
                settings: RwLock::new(settings),
                orchestrator,
                watcher,
                watch_rx: Mutex::new(watch_rx),
                events,
            }),
        })
    }

    /// Start background behaviour: change watching and the startup scan
    ///
    /// Idempotent in effect but the watch loop is only spawned on the first
    /// call. Safe to skip entirely for purely on-demand use.
    pub async fn start(&self) -> Result<()> {
        let settings = self.settings().await;

        if settings.watch_for_changes {
            self.inner.watcher.sync_with_settings(&settings).await?;
        }

        let watch_rx = self
            .inner
            .watch_rx
            .lock()
            .map_err(|_| IndexError::Watch("watcher receiver lock poisoned".to_string()))?
            .take();
        if let Some(rx) = watch_rx {
            let engine = self.clone();
            tokio::spawn(async move {
                engine.run_watch_loop(rx).await;
            });
        }

        if settings.scan_on_startup {
            let engine = self.clone();
            tokio::spawn(async move {
                match engine.scan().await {
                    Ok(report) => info!(
                        "startup scan: {} new, {} removed",
                        report.new_tracks, report.removed_tracks
                    ),
                    Err(IndexError::ScanInProgress) => {}
                    Err(e) => error!("startup scan failed: {e}"),
                }
            });
        }

        Ok(())
    }

    // --- Commands ---

    /// Add a root directory to the library configuration
    ///
    /// The directory must exist; duplicates are rejected. The change is
    /// persisted and the watcher picks the new root up immediately. Indexing
    /// of its contents happens on the next scan.
    pub async fn add_directory(&self, path: &Path) -> Result<()> {
        if !path.is_dir() {
            return Err(IndexError::Config(format!(
                "not a directory: {}",
                path.display()
            )));
        }

        let updated = {
            let mut settings = self.inner.settings.write().await;
            if settings.music_directories.iter().any(|d| d == path) {
                return Err(IndexError::Config(format!(
                    "directory already configured: {}",
                    path.display()
                )));
            }
            settings.music_directories.push(path.to_path_buf());
            settings.clone()
        };

        settings_store::save(&self.inner.pool, &updated).await?;
        info!("added library directory: {}", path.display());

        if updated.watch_for_changes {
            self.inner.watcher.sync_with_settings(&updated).await?;
        }
        let _ = self.inner.events.send(ScanEvent::SettingsChanged);
        Ok(())
    }

    /// Remove a root directory and every track indexed under it
    ///
    /// Tracks are removed with the usual cascade, so albums and artists left
    /// without tracks disappear too.
    pub async fn remove_directory(&self, path: &Path) -> Result<()> {
        let updated = {
            let mut settings = self.inner.settings.write().await;
            let before = settings.music_directories.len();
            settings.music_directories.retain(|d| d != path);
            if settings.music_directories.len() == before {
                return Err(IndexError::Config(format!(
                    "directory not configured: {}",
                    path.display()
                )));
            }
            settings.clone()
        };

        settings_store::save(&self.inner.pool, &updated).await?;
        self.inner.watcher.unwatch(path).await;

        let removed = tracks::remove_under_directory(&self.inner.pool, path).await?;
        info!(
            "removed library directory {} ({} tracks)",
            path.display(),
            removed
        );

        let _ = self.inner.events.send(ScanEvent::SettingsChanged);
        Ok(())
    }

    /// Apply a partial settings update and persist the result
    pub async fn update_settings(&self, update: SettingsUpdate) -> Result<LibrarySettings> {
        let updated = {
            let mut settings = self.inner.settings.write().await;
            update.apply(&mut settings);
            settings.clone()
        };

        settings_store::save(&self.inner.pool, &updated).await?;

        if updated.watch_for_changes {
            self.inner.watcher.sync_with_settings(&updated).await?;
        } else {
            self.inner.watcher.stop_all().await;
        }

        let _ = self.inner.events.send(ScanEvent::SettingsChanged);
        Ok(updated)
    }

    /// Run a full scan over every configured directory
    pub async fn scan(&self) -> Result<ScanReport> {
        let settings = self.settings().await;
        self.inner.orchestrator.scan_all(&settings).await
    }

    /// Run a scoped scan limited to one path under a configured root
    pub async fn scan_path(&self, path: &Path) -> Result<ScanReport> {
        let settings = self.settings().await;
        if !settings.contains_path(path) {
            return Err(IndexError::Config(format!(
                "path is outside the configured directories: {}",
                path.display()
            )));
        }
        self.inner.orchestrator.scan_path(&settings, path).await
    }

    /// Request cancellation of the running scan, if any
    pub fn cancel_scan(&self) {
        self.inner.orchestrator.cancel();
    }

    /// Remove a single track by path (cascades like any other removal)
    pub async fn remove_track(&self, path: &Path) -> Result<bool> {
        Ok(tracks::remove_by_path(&self.inner.pool, path).await?)
    }

    // --- Queries ---

    /// Snapshot of the current settings
    pub async fn settings(&self) -> LibrarySettings {
        self.inner.settings.read().await.clone()
    }

    pub async fn tracks(&self) -> Result<Vec<Track>> {
        Ok(tracks::get_all(&self.inner.pool).await?)
    }

    pub async fn track_by_id(&self, id: TrackId) -> Result<Option<Track>> {
        Ok(tracks::get_by_id(&self.inner.pool, id).await?)
    }

    pub async fn track_by_path(&self, path: &Path) -> Result<Option<Track>> {
        Ok(tracks::get_by_path(&self.inner.pool, path).await?)
    }

    pub async fn tracks_by_album(
        &self,
        album: &str,
        artist: Option<&str>,
    ) -> Result<Vec<Track>> {
        Ok(tracks::get_by_album(&self.inner.pool, album, artist).await?)
    }

    pub async fn tracks_by_artist(&self, artist: &str) -> Result<Vec<Track>> {
        Ok(tracks::get_by_artist(&self.inner.pool, artist).await?)
    }

    /// Case-insensitive substring search over titles, artists and albums
    pub async fn search(&self, query: &str) -> Result<Vec<Track>> {
        Ok(tracks::search(&self.inner.pool, query).await?)
    }

    pub async fn albums(&self) -> Result<Vec<Album>> {
        Ok(albums::get_all(&self.inner.pool).await?)
    }

    pub async fn artists(&self) -> Result<Vec<Artist>> {
        Ok(artists::get_all(&self.inner.pool).await?)
    }

    /// Library statistics, derived from the current rows
    pub async fn stats(&self) -> Result<LibraryStats> {
        Ok(stats::get(&self.inner.pool).await?)
    }

    pub fn is_scanning(&self) -> bool {
        self.inner.orchestrator.is_scanning()
    }

    pub async fn scan_progress(&self) -> ScanProgress {
        self.inner.orchestrator.progress().await
    }

    /// Subscribe to the engine's event stream
    ///
    /// Slow subscribers may observe `Lagged`; events are advisory and the
    /// query surface is always the source of truth.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.inner.events.subscribe()
    }

    /// Stop watchers and close the database pool
    pub async fn close(&self) {
        self.inner.watcher.stop_all().await;
        self.inner.pool.close().await;
    }

    // --- Watch event handling ---

    async fn run_watch_loop(&self, mut rx: mpsc::Receiver<(PathBuf, WatchEvent)>) {
        while let Some((root, event)) = rx.recv().await {
            if let Err(e) = self.handle_watch_event(&root, event).await {
                warn!("failed to handle filesystem event: {e}");
            }
        }
        debug!("watch event loop ended");
    }

    /// Removals always apply; only the re-index half is gated on
    /// `auto_index_new_files`, so a stale row never lingers just because
    /// automatic indexing is off.
    async fn handle_watch_event(&self, root: &Path, event: WatchEvent) -> Result<()> {
        let settings = self.settings().await;
        debug!("filesystem event under {}: {:?}", root.display(), event);

        match event {
            WatchEvent::Created(path) | WatchEvent::Modified(path) => {
                if !settings.auto_index_new_files {
                    return Ok(());
                }
                self.index_changed_path(&settings, &path).await
            }
            WatchEvent::Removed(path) => {
                // Could have been a file or a whole directory; try both
                if !tracks::remove_by_path(&self.inner.pool, &path).await? {
                    tracks::remove_under_directory(&self.inner.pool, &path).await?;
                }
                Ok(())
            }
            WatchEvent::Renamed(old, new) => {
                if !tracks::remove_by_path(&self.inner.pool, &old).await? {
                    tracks::remove_under_directory(&self.inner.pool, &old).await?;
                }
                if !settings.auto_index_new_files {
                    return Ok(());
                }
                self.index_changed_path(&settings, &new).await
            }
        }
    }

    /// Scoped rescan for a created or modified path
    ///
    /// A scan already in progress will pick the change up itself, so the
    /// rejection is ignored here.
    async fn index_changed_path(
        &self,
        settings: &LibrarySettings,
        path: &Path,
    ) -> Result<()> {
        if path.is_file() {
            let supported = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| settings.supports_extension(e))
                .unwrap_or(false);
            if !supported {
                return Ok(());
            }
        } else if !path.is_dir() {
            // Vanished again before we got to it
            return Ok(());
        }

        match self.inner.orchestrator.scan_path(settings, path).await {
            Ok(_) | Err(IndexError::ScanInProgress) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
