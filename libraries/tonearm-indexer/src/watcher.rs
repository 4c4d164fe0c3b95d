//! Filesystem watcher for library directories
//!
//! Watches configured music directories for changes and forwards debounced
//! events to the engine, which turns them into scoped rescans. Debouncing
//! collapses editor save bursts and partial copies into a single event.
//!
//! # Platform Support
//!
//! - Windows: `ReadDirectoryChangesW`
//! - macOS: `FSEvents`
//! - Linux: `inotify`

use crate::{IndexError, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, RecommendedCache};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tonearm_core::LibrarySettings;
use tracing::{debug, info, warn};

/// Default debounce duration in milliseconds
const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Filesystem event that has been debounced and is ready for processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A file was created or moved into a watched directory
    Created(PathBuf),
    /// A file was modified
    Modified(PathBuf),
    /// A file was deleted or moved out of a watched directory
    Removed(PathBuf),
    /// A file was renamed (old path, new path)
    Renamed(PathBuf, PathBuf),
}

impl WatchEvent {
    /// The path this event is primarily about (the new path for renames)
    pub fn path(&self) -> &Path {
        match self {
            Self::Created(p) | Self::Modified(p) | Self::Removed(p) => p,
            Self::Renamed(_, new) => new,
        }
    }
}

/// Watches library directories for filesystem changes
///
/// Each watched root owns its own debouncer; all of them feed one mpsc
/// channel whose receiver the engine takes with [`take_event_receiver`].
///
/// [`take_event_receiver`]: LibraryWatcher::take_event_receiver
pub struct LibraryWatcher {
    debounce: Duration,
    /// Active watchers by root path
    watchers: Arc<RwLock<HashMap<PathBuf, WatchHandle>>>,
    event_tx: mpsc::Sender<(PathBuf, WatchEvent)>,
    /// Held until the engine claims it
    event_rx: Option<mpsc::Receiver<(PathBuf, WatchEvent)>>,
}

/// Handle to a single directory watcher
struct WatchHandle {
    path: PathBuf,
    // The debouncer owns the watcher, so we need to keep it alive
    #[allow(dead_code)]
    debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
}

impl LibraryWatcher {
    /// Create a new watcher with the default debounce window
    pub fn new() -> Self {
        Self::with_debounce(Duration::from_millis(DEFAULT_DEBOUNCE_MS))
    }

    /// Create a new watcher with a custom debounce window
    pub fn with_debounce(debounce: Duration) -> Self {
        let (event_tx, event_rx) = mpsc::channel(1000);

        Self {
            debounce,
            watchers: Arc::new(RwLock::new(HashMap::new())),
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    /// Start watching a single root directory
    pub async fn watch(&self, root: &Path) -> Result<()> {
        if !root.exists() {
            warn!("Cannot watch non-existent path: {}", root.display());
            return Ok(());
        }

        if self.watchers.read().await.contains_key(root) {
            return Ok(());
        }

        let event_tx = self.event_tx.clone();
        let event_root = root.to_path_buf();

        let mut debouncer = new_debouncer(
            self.debounce,
            None,
            move |result: DebounceEventResult| match result {
                Ok(events) => {
                    for event in events {
                        if let Some(watch_event) = convert_event(&event.event) {
                            let _ = event_tx.blocking_send((event_root.clone(), watch_event));
                        }
                    }
                }
                Err(errors) => {
                    for error in errors {
                        warn!("Watcher error: {:?}", error);
                    }
                }
            },
        )
        .map_err(|e| IndexError::Watch(format!("failed to create debouncer: {e}")))?;

        debouncer
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| IndexError::Watch(format!("failed to watch path: {e}")))?;

        let handle = WatchHandle {
            path: root.to_path_buf(),
            debouncer,
        };

        self.watchers
            .write()
            .await
            .insert(root.to_path_buf(), handle);

        info!("Started watching: {}", root.display());
        Ok(())
    }

    /// Stop watching a root directory
    pub async fn unwatch(&self, root: &Path) {
        if let Some(handle) = self.watchers.write().await.remove(root) {
            info!("Stopped watching: {}", handle.path.display());
        }
    }

    /// Reconcile active watchers against the configured directories
    ///
    /// Starts watchers for new roots and drops watchers for removed ones,
    /// so it is safe to call after every settings change.
    pub async fn sync_with_settings(&self, settings: &LibrarySettings) -> Result<()> {
        let wanted: Vec<PathBuf> = settings.music_directories.clone();

        let stale: Vec<PathBuf> = {
            let watchers = self.watchers.read().await;
            watchers
                .keys()
                .filter(|root| !wanted.contains(root))
                .cloned()
                .collect()
        };
        for root in stale {
            self.unwatch(&root).await;
        }

        for root in &wanted {
            if let Err(e) = self.watch(root).await {
                warn!("Failed to watch {}: {}", root.display(), e);
            }
        }

        Ok(())
    }

    /// Stop all watchers
    pub async fn stop_all(&self) {
        self.watchers.write().await.clear();
        debug!("Stopped all watchers");
    }

    /// Take the event receiver for processing
    ///
    /// This can only be called once; the engine drains events from it.
    pub fn take_event_receiver(&mut self) -> Option<mpsc::Receiver<(PathBuf, WatchEvent)>> {
        self.event_rx.take()
    }

    /// Get the number of active watchers
    pub async fn watcher_count(&self) -> usize {
        self.watchers.read().await.len()
    }

    /// Check if a root is being watched
    pub async fn is_watching(&self, root: &Path) -> bool {
        self.watchers.read().await.contains_key(root)
    }
}

impl Default for LibraryWatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a notify event to a [`WatchEvent`]
fn convert_event(event: &Event) -> Option<WatchEvent> {
    use notify::event::{ModifyKind, RenameMode};

    let paths = &event.paths;

    match &event.kind {
        EventKind::Create(_) => paths.first().map(|p| WatchEvent::Created(p.clone())),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if paths.len() == 2 => {
            Some(WatchEvent::Renamed(paths[0].clone(), paths[1].clone()))
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            paths.first().map(|p| WatchEvent::Removed(p.clone()))
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            paths.first().map(|p| WatchEvent::Created(p.clone()))
        }
        EventKind::Modify(_) => paths.first().map(|p| WatchEvent::Modified(p.clone())),
        EventKind::Remove(_) => paths.first().map(|p| WatchEvent::Removed(p.clone())),
        EventKind::Other => {
            // Rename events sometimes surface as Other with both paths
            if paths.len() == 2 {
                Some(WatchEvent::Renamed(paths[0].clone(), paths[1].clone()))
            } else {
                paths.first().map(|p| WatchEvent::Modified(p.clone()))
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: EventKind, paths: Vec<PathBuf>) -> Event {
        Event {
            kind,
            paths,
            attrs: Default::default(),
        }
    }

    #[test]
    fn test_convert_create_event() {
        let event = event(
            EventKind::Create(notify::event::CreateKind::File),
            vec![PathBuf::from("/music/file.flac")],
        );

        let result = convert_event(&event);
        assert!(matches!(result, Some(WatchEvent::Created(_))));
    }

    #[test]
    fn test_convert_modify_event() {
        let event = event(
            EventKind::Modify(notify::event::ModifyKind::Data(
                notify::event::DataChange::Any,
            )),
            vec![PathBuf::from("/music/file.flac")],
        );

        let result = convert_event(&event);
        assert!(matches!(result, Some(WatchEvent::Modified(_))));
    }

    #[test]
    fn test_convert_remove_event() {
        let event = event(
            EventKind::Remove(notify::event::RemoveKind::File),
            vec![PathBuf::from("/music/file.flac")],
        );

        let result = convert_event(&event);
        assert!(matches!(result, Some(WatchEvent::Removed(_))));
    }

    #[test]
    fn test_convert_rename_event() {
        let event = event(
            EventKind::Modify(notify::event::ModifyKind::Name(
                notify::event::RenameMode::Both,
            )),
            vec![PathBuf::from("/music/old.mp3"), PathBuf::from("/music/new.mp3")],
        );

        let result = convert_event(&event);
        assert_eq!(
            result,
            Some(WatchEvent::Renamed(
                PathBuf::from("/music/old.mp3"),
                PathBuf::from("/music/new.mp3"),
            ))
        );
    }

    #[test]
    fn test_access_events_ignored() {
        let event = event(
            EventKind::Access(notify::event::AccessKind::Read),
            vec![PathBuf::from("/music/file.mp3")],
        );

        assert!(convert_event(&event).is_none());
    }

    #[tokio::test]
    async fn test_watch_nonexistent_path_is_noop() {
        let watcher = LibraryWatcher::new();
        watcher
            .watch(Path::new("/definitely/not/there"))
            .await
            .unwrap();
        assert_eq!(watcher.watcher_count().await, 0);
    }

    #[tokio::test]
    async fn test_sync_with_settings_adds_and_removes() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();

        let watcher = LibraryWatcher::new();

        let mut settings = LibrarySettings {
            music_directories: vec![dir_a.path().to_path_buf()],
            ..Default::default()
        };
        watcher.sync_with_settings(&settings).await.unwrap();
        assert!(watcher.is_watching(dir_a.path()).await);
        assert_eq!(watcher.watcher_count().await, 1);

        settings.music_directories = vec![dir_b.path().to_path_buf()];
        watcher.sync_with_settings(&settings).await.unwrap();
        assert!(!watcher.is_watching(dir_a.path()).await);
        assert!(watcher.is_watching(dir_b.path()).await);
        assert_eq!(watcher.watcher_count().await, 1);
    }
}
