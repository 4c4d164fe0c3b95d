/// Scan progress and reporting types
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Transient progress of an in-flight scan
///
/// One instance per scan; reset at scan start, finalized at completion.
/// Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanProgress {
    /// Whether a scan is currently running
    pub is_scanning: bool,

    /// Files processed so far (failures count as scanned)
    pub scanned_files: usize,

    /// Total candidate files determined during enumeration
    pub total_files: usize,

    /// File currently being processed
    pub current_file: Option<PathBuf>,

    /// Per-file error messages accumulated so far
    pub errors: Vec<String>,
}

impl ScanProgress {
    /// Completion percentage in the 0..=100 range
    pub fn percentage(&self) -> f32 {
        if self.total_files == 0 {
            return 100.0;
        }
        (self.scanned_files as f32 / self.total_files as f32) * 100.0
    }
}

/// Summary of a completed scan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Candidate files enumerated
    pub total_files: usize,

    /// Files processed (successes and failures)
    pub scanned_files: usize,

    /// Tracks inserted for the first time
    pub new_tracks: usize,

    /// Tracks whose metadata was refreshed
    pub updated_tracks: usize,

    /// Files seen but unchanged since the previous scan
    pub unchanged_tracks: usize,

    /// Tracks removed because their file disappeared
    pub removed_tracks: usize,

    /// Per-file failures, full list (not capped)
    pub errors: Vec<(PathBuf, String)>,
}

impl ScanReport {
    /// Merge another report into this one (multi-root scans)
    pub fn merge(&mut self, other: ScanReport) {
        self.total_files += other.total_files;
        self.scanned_files += other.scanned_files;
        self.new_tracks += other.new_tracks;
        self.updated_tracks += other.updated_tracks;
        self.unchanged_tracks += other.unchanged_tracks;
        self.removed_tracks += other.removed_tracks;
        self.errors.extend(other.errors);
    }

    /// Whether the scan performed any library mutation
    pub fn mutated(&self) -> bool {
        self.new_tracks > 0 || self.updated_tracks > 0 || self.removed_tracks > 0
    }
}
