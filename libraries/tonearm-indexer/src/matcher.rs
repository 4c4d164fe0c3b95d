//! Include/exclude rules for filesystem entries
//!
//! The matcher is a pure function of the entry and the active settings,
//! which keeps it unit-testable against the full configuration matrix.
//! Exclude patterns are globs matched against individual path components
//! below the configured root, so `node_modules` skips that directory
//! anywhere in the tree and `.*` skips hidden entries.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::path::{Component, Path};
use tonearm_core::LibrarySettings;

/// Decision for a single filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchDecision {
    /// Directory should be walked into
    Descend,
    /// File is approved for metadata extraction
    IndexCandidate,
    /// Entry is ignored
    Skip,
}

/// Evaluates candidate entries against the configured include/exclude rules
#[derive(Debug, Clone)]
pub struct PathMatcher {
    formats: HashSet<String>,
    excludes: GlobSet,
    include_subdirectories: bool,
}

impl PathMatcher {
    /// Build a matcher from the active settings
    ///
    /// Invalid exclude patterns are logged and ignored rather than failing
    /// the scan.
    pub fn new(settings: &LibrarySettings) -> Self {
        let formats = settings
            .supported_formats
            .iter()
            .map(|f| f.to_lowercase())
            .collect();

        let mut builder = GlobSetBuilder::new();
        for pattern in &settings.exclude_patterns {
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => {
                    tracing::warn!("ignoring invalid exclude pattern {:?}: {}", pattern, e);
                }
            }
        }
        let excludes = builder.build().unwrap_or_else(|_| GlobSet::empty());

        Self {
            formats,
            excludes,
            include_subdirectories: settings.include_subdirectories,
        }
    }

    /// Evaluate an entry
    ///
    /// `path` is relative to the configured root; `is_root` marks the root
    /// itself (always descended into, regardless of the recursion flag).
    pub fn evaluate(&self, path: &Path, is_dir: bool, is_root: bool) -> MatchDecision {
        if !is_root && self.is_excluded(path) {
            return MatchDecision::Skip;
        }

        if is_dir {
            if is_root || self.include_subdirectories {
                MatchDecision::Descend
            } else {
                MatchDecision::Skip
            }
        } else if self.has_supported_extension(path) {
            MatchDecision::IndexCandidate
        } else {
            MatchDecision::Skip
        }
    }

    /// Check whether a file's extension is in the supported set
    pub fn has_supported_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.formats.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        path.components().any(|component| match component {
            Component::Normal(segment) => self.excludes.is_match(Path::new(segment)),
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn settings(
        formats: &[&str],
        excludes: &[&str],
        include_subdirectories: bool,
    ) -> LibrarySettings {
        LibrarySettings {
            music_directories: vec![PathBuf::from("/music")],
            supported_formats: formats.iter().map(|s| (*s).to_string()).collect(),
            exclude_patterns: excludes.iter().map(|s| (*s).to_string()).collect(),
            include_subdirectories,
            ..Default::default()
        }
    }

    #[test]
    fn supported_extension_is_candidate() {
        let matcher = PathMatcher::new(&settings(&["mp3", "flac"], &[], true));
        assert_eq!(
            matcher.evaluate(Path::new("a.mp3"), false, false),
            MatchDecision::IndexCandidate
        );
        assert_eq!(
            matcher.evaluate(Path::new("a.MP3"), false, false),
            MatchDecision::IndexCandidate
        );
        assert_eq!(
            matcher.evaluate(Path::new("a.txt"), false, false),
            MatchDecision::Skip
        );
        assert_eq!(
            matcher.evaluate(Path::new("noext"), false, false),
            MatchDecision::Skip
        );
    }

    #[test]
    fn exclude_pattern_matches_any_component() {
        let matcher = PathMatcher::new(&settings(&["mp3"], &["node_modules"], true));
        assert_eq!(
            matcher.evaluate(Path::new("deep/node_modules/x.mp3"), false, false),
            MatchDecision::Skip
        );
        assert_eq!(
            matcher.evaluate(Path::new("node_modules"), true, false),
            MatchDecision::Skip
        );
        assert_eq!(
            matcher.evaluate(Path::new("deep/other/x.mp3"), false, false),
            MatchDecision::IndexCandidate
        );
    }

    #[test]
    fn hidden_entries_are_excluded_by_dot_pattern() {
        let matcher = PathMatcher::new(&settings(&["mp3"], &[".*"], true));
        assert_eq!(
            matcher.evaluate(Path::new(".hidden/a.mp3"), false, false),
            MatchDecision::Skip
        );
        assert_eq!(
            matcher.evaluate(Path::new(".cache"), true, false),
            MatchDecision::Skip
        );
        assert_eq!(
            matcher.evaluate(Path::new("visible/a.mp3"), false, false),
            MatchDecision::IndexCandidate
        );
    }

    #[test]
    fn subdirectories_follow_recursion_flag() {
        let recursive = PathMatcher::new(&settings(&["mp3"], &[], true));
        assert_eq!(
            recursive.evaluate(Path::new("sub"), true, false),
            MatchDecision::Descend
        );

        let flat = PathMatcher::new(&settings(&["mp3"], &[], false));
        assert_eq!(
            flat.evaluate(Path::new("sub"), true, false),
            MatchDecision::Skip
        );
        // Configured roots always descend
        assert_eq!(flat.evaluate(Path::new(""), true, true), MatchDecision::Descend);
    }

    #[test]
    fn invalid_exclude_pattern_is_ignored() {
        let matcher = PathMatcher::new(&settings(&["mp3"], &["[unclosed"], true));
        assert_eq!(
            matcher.evaluate(Path::new("a.mp3"), false, false),
            MatchDecision::IndexCandidate
        );
    }
}
