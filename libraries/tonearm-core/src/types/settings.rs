/// Library settings
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persistent scan configuration
///
/// Loaded from the settings store on startup; changes take effect on the
/// next scan, not retroactively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LibrarySettings {
    /// Root directories configured for scanning
    pub music_directories: Vec<PathBuf>,

    /// Watch configured roots for filesystem changes
    pub watch_for_changes: bool,

    /// Trigger a full scan when the engine starts
    pub scan_on_startup: bool,

    /// Index files reported by the watcher without waiting for a manual scan
    pub auto_index_new_files: bool,

    /// Supported file extensions, lowercased, without the leading dot
    pub supported_formats: Vec<String>,

    /// Glob patterns matched against individual path components
    pub exclude_patterns: Vec<String>,

    /// Recurse into subdirectories of each root
    pub include_subdirectories: bool,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            music_directories: Vec::new(),
            watch_for_changes: true,
            scan_on_startup: false,
            auto_index_new_files: true,
            supported_formats: vec![
                "mp3".to_string(),
                "flac".to_string(),
                "ogg".to_string(),
                "opus".to_string(),
                "wav".to_string(),
                "m4a".to_string(),
                "aac".to_string(),
            ],
            exclude_patterns: vec![".*".to_string(), "node_modules".to_string()],
            include_subdirectories: true,
        }
    }
}

/// Partial settings update
///
/// Fields left as `None` keep their current value. Directory membership is
/// managed through the engine's add/remove commands, not here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsUpdate {
    pub watch_for_changes: Option<bool>,
    pub scan_on_startup: Option<bool>,
    pub auto_index_new_files: Option<bool>,
    pub supported_formats: Option<Vec<String>>,
    pub exclude_patterns: Option<Vec<String>>,
    pub include_subdirectories: Option<bool>,
}

impl SettingsUpdate {
    /// Apply the update on top of existing settings
    pub fn apply(self, settings: &mut LibrarySettings) {
        if let Some(v) = self.watch_for_changes {
            settings.watch_for_changes = v;
        }
        if let Some(v) = self.scan_on_startup {
            settings.scan_on_startup = v;
        }
        if let Some(v) = self.auto_index_new_files {
            settings.auto_index_new_files = v;
        }
        if let Some(formats) = self.supported_formats {
            settings.supported_formats = formats.iter().map(|f| f.to_lowercase()).collect();
        }
        if let Some(patterns) = self.exclude_patterns {
            settings.exclude_patterns = patterns;
        }
        if let Some(v) = self.include_subdirectories {
            settings.include_subdirectories = v;
        }
    }
}

impl LibrarySettings {
    /// Check whether an extension is in the supported set (case-insensitive)
    pub fn supports_extension(&self, ext: &str) -> bool {
        let ext = ext.to_lowercase();
        self.supported_formats.iter().any(|f| f == &ext)
    }

    /// Check whether a path lies under one of the configured roots
    pub fn contains_path(&self, path: &Path) -> bool {
        self.music_directories.iter().any(|d| path.starts_with(d))
    }
}
