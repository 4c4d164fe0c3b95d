//! Scan orchestration
//!
//! Drives a scan through its stages: enumerate candidates with the matcher,
//! extract metadata on a bounded blocking pool, reconcile results into the
//! store serially, then remove previously-indexed tracks that were not seen.
//! Progress and completion are reported on a broadcast event stream.
//!
//! Only one scan runs at a time; a request while one is active is rejected
//! with [`IndexError::ScanInProgress`] (the UI disables its trigger while
//! `is_scanning`, so rejection beats queueing here).

use crate::matcher::PathMatcher;
use crate::scanner::DirectoryScanner;
use crate::{IndexError, Result};
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, RwLock};
use tonearm_core::{LibrarySettings, ScanEvent, ScanProgress, ScanReport};
use tonearm_storage::tracks::{self, UpsertOutcome};

/// Emit a progress event every this many scanned files
const PROGRESS_EVERY: usize = 25;

/// Orchestrates scans against the library store
pub struct ScanOrchestrator {
    pool: SqlitePool,
    events: broadcast::Sender<ScanEvent>,
    progress: Arc<RwLock<ScanProgress>>,
    scanning: Arc<AtomicBool>,
    cancelled: Arc<AtomicBool>,
    /// Bounded extraction parallelism (I/O bound, capped for spinning media)
    workers: usize,
}

impl ScanOrchestrator {
    /// Create an orchestrator sharing the engine's event channel
    pub fn new(pool: SqlitePool, events: broadcast::Sender<ScanEvent>) -> Self {
        Self {
            pool,
            events,
            progress: Arc::new(RwLock::new(ScanProgress::default())),
            scanning: Arc::new(AtomicBool::new(false)),
            cancelled: Arc::new(AtomicBool::new(false)),
            workers: num_cpus::get().min(8),
        }
    }

    /// Override the extraction worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Whether a scan is currently running
    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }

    /// Snapshot of the in-flight scan's progress
    ///
    /// `is_scanning` is derived from the scanning flag at snapshot time, so
    /// it is accurate on every exit path, including failed scans.
    pub async fn progress(&self) -> ScanProgress {
        let mut progress = self.progress.read().await.clone();
        progress.is_scanning = self.is_scanning();
        progress
    }

    /// Request cancellation of the running scan
    ///
    /// New extraction work stops promptly; reconcile writes for files
    /// already extracted still land, so the store is never left half-upserted.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Full scan over every configured root directory
    pub async fn scan_all(&self, settings: &LibrarySettings) -> Result<ScanReport> {
        let scopes: Vec<(PathBuf, PathBuf)> = settings
            .music_directories
            .iter()
            .map(|d| (d.clone(), d.clone()))
            .collect();
        self.scan_scopes(settings, &scopes).await
    }

    /// Scoped scan limited to one path (a root, a subtree, or a single file)
    ///
    /// Entries are still evaluated relative to the configured root that
    /// contains `path`, so exclusion rules match a full scan exactly.
    pub async fn scan_path(&self, settings: &LibrarySettings, path: &Path) -> Result<ScanReport> {
        let base = settings
            .music_directories
            .iter()
            .find(|d| path.starts_with(d))
            .cloned()
            .unwrap_or_else(|| path.to_path_buf());
        self.scan_scopes(settings, &[(path.to_path_buf(), base)])
            .await
    }

    /// Run the scan stages over `(walk, base)` scopes, where `walk` is the
    /// path actually enumerated and `base` the configured root it lies under
    async fn scan_scopes(
        &self,
        settings: &LibrarySettings,
        scopes: &[(PathBuf, PathBuf)],
    ) -> Result<ScanReport> {
        if self.scanning.swap(true, Ordering::SeqCst) {
            return Err(IndexError::ScanInProgress);
        }
        let _guard = ScanGuard {
            scanning: self.scanning.as_ref(),
        };
        self.cancelled.store(false, Ordering::SeqCst);

        let started = Instant::now();
        let matcher = PathMatcher::new(settings);
        let scanner = DirectoryScanner::new(matcher.clone());

        {
            let mut progress = self.progress.write().await;
            *progress = ScanProgress::default();
        }
        let _ = self.events.send(ScanEvent::ScanStarted);

        let mut report = ScanReport::default();

        // Fix the candidate list (and total_files) up front
        let mut per_root: Vec<(PathBuf, Vec<PathBuf>)> = Vec::new();
        let mut accessible = 0usize;
        for (walk, base) in scopes {
            match scanner.enumerate(walk, base) {
                Ok(candidates) => {
                    accessible += 1;
                    report.total_files += candidates.len();
                    per_root.push((walk.clone(), candidates));
                }
                Err(e) => {
                    tracing::warn!("cannot enumerate {}: {}", walk.display(), e);
                    report.errors.push((walk.clone(), e.to_string()));
                }
            }
        }

        if accessible == 0 && !scopes.is_empty() {
            let err = IndexError::NothingToScan;
            let _ = self.events.send(ScanEvent::ScanError {
                error: err.to_string(),
            });
            return Err(err);
        }

        {
            let mut progress = self.progress.write().await;
            progress.total_files = report.total_files;
            progress.errors = report
                .errors
                .iter()
                .map(|(p, e)| format!("{}: {}", p.display(), e))
                .collect();
        }

        // Extract and reconcile per root so unseen-track removal stays
        // scoped to the directory that was actually walked
        for (root, candidates) in per_root {
            let seen = match self.extract_and_reconcile(&candidates, &mut report).await {
                Ok(seen) => seen,
                Err(e) => {
                    // Store write failures are fatal to the scan; state so far
                    // is preserved (each upsert was its own transaction)
                    let _ = self.events.send(ScanEvent::ScanError {
                        error: e.to_string(),
                    });
                    return Err(e);
                }
            };

            if root.is_dir() && !self.cancelled.load(Ordering::SeqCst) {
                report.removed_tracks += self.remove_unseen(&root, &seen).await?;
            }
        }

        {
            let mut progress = self.progress.write().await;
            progress.current_file = None;
        }
        let _ = self.events.send(ScanEvent::completed(&report.errors));

        tracing::info!(
            "scan completed in {:?}: {} new, {} updated, {} unchanged, {} removed, {} errors",
            started.elapsed(),
            report.new_tracks,
            report.updated_tracks,
            report.unchanged_tracks,
            report.removed_tracks,
            report.errors.len()
        );

        Ok(report)
    }

    /// Extract candidates on the bounded pool and upsert results serially
    ///
    /// Returns the set of paths seen this pass. Candidates are processed in
    /// worker-sized batches; cancellation is honoured between batches while
    /// in-flight extractions still reconcile.
    async fn extract_and_reconcile(
        &self,
        candidates: &[PathBuf],
        report: &mut ScanReport,
    ) -> Result<HashSet<PathBuf>> {
        let mut seen = HashSet::with_capacity(candidates.len());

        for batch in candidates.chunks(self.workers.max(1)) {
            if self.cancelled.load(Ordering::SeqCst) {
                tracing::info!("scan cancelled, stopping extraction");
                break;
            }

            let handles: Vec<_> = batch
                .iter()
                .map(|path| {
                    let path = path.clone();
                    tokio::task::spawn_blocking(move || {
                        let result = tonearm_metadata::extract(&path, true);
                        (path, result)
                    })
                })
                .collect();

            for handle in handles {
                let (path, result) = handle
                    .await
                    .map_err(|e| IndexError::Io(std::io::Error::other(e)))?;

                report.scanned_files += 1;
                seen.insert(path.clone());

                match result {
                    Ok(meta) => {
                        let (_, outcome) = tracks::upsert(&self.pool, &meta).await?;
                        match outcome {
                            UpsertOutcome::Inserted => report.new_tracks += 1,
                            UpsertOutcome::Updated => report.updated_tracks += 1,
                            UpsertOutcome::Unchanged => report.unchanged_tracks += 1,
                        }
                    }
                    Err(e) => {
                        tracing::warn!("failed to extract {}: {}", path.display(), e);
                        report.errors.push((path.clone(), e.to_string()));
                    }
                }

                self.publish_progress(report, Some(path)).await;
            }
        }

        Ok(seen)
    }

    /// Remove previously-indexed tracks under `root` that were not seen
    ///
    /// This is how deletions and renames are detected for files no longer
    /// matched by the configuration.
    async fn remove_unseen(&self, root: &Path, seen: &HashSet<PathBuf>) -> Result<usize> {
        let existing = tracks::file_info_under_directory(&self.pool, root).await?;

        let stale: Vec<_> = existing
            .into_iter()
            .filter(|info| !seen.contains(&info.file_path))
            .collect();

        for info in &stale {
            tracks::remove_by_id(&self.pool, info.id).await?;
            tracing::debug!("removed vanished track {}", info.file_path.display());
        }

        Ok(stale.len())
    }

    /// Update shared progress and emit a throttled `ScanProgress` event
    async fn publish_progress(&self, report: &ScanReport, current: Option<PathBuf>) {
        let (scanned, total, current_file) = {
            let mut progress = self.progress.write().await;
            progress.scanned_files = report.scanned_files;
            progress.current_file = current;
            if let Some((path, error)) = report.errors.last() {
                let line = format!("{}: {}", path.display(), error);
                if progress.errors.last() != Some(&line) {
                    progress.errors.push(line);
                }
            }
            (
                progress.scanned_files,
                progress.total_files,
                progress.current_file.clone(),
            )
        };

        if scanned % PROGRESS_EVERY == 0 || scanned == total {
            let _ = self.events.send(ScanEvent::ScanProgress {
                scanned_files: scanned,
                total_files: total,
                current_file,
            });
        }
    }
}

/// Resets the scanning flag on every exit path, including early errors
///
/// Progress snapshots derive `is_scanning` from this flag, so clearing it
/// here is sufficient; no lock is needed in `drop`.
struct ScanGuard<'a> {
    scanning: &'a AtomicBool,
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.scanning.store(false, Ordering::SeqCst);
    }
}
