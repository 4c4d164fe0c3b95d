//! Directory enumeration
//!
//! Walks a configured root with `walkdir`, consulting the path matcher at
//! every entry. Pruned directories are never descended into, so excluded
//! subtrees cost nothing.

use crate::matcher::{MatchDecision, PathMatcher};
use crate::{IndexError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Enumerates candidate files under a root directory
pub struct DirectoryScanner {
    matcher: PathMatcher,
    /// Whether to follow symbolic links
    follow_links: bool,
}

impl DirectoryScanner {
    /// Create a scanner around a matcher
    pub fn new(matcher: PathMatcher) -> Self {
        Self {
            matcher,
            follow_links: false,
        }
    }

    /// Set whether to follow symbolic links
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Enumerate candidate files under `root`
    ///
    /// `base` is the configured library root; entries are evaluated by their
    /// path relative to it, so exclusion rules apply identically whether the
    /// walk starts at the root or at a scoped subtree (or a single file,
    /// which is returned as the only candidate when the matcher approves
    /// its full relative path).
    pub fn enumerate(&self, root: &Path, base: &Path) -> Result<Vec<PathBuf>> {
        if !root.exists() {
            return Err(IndexError::Config(format!(
                "{} does not exist",
                root.display()
            )));
        }

        if root.is_file() {
            let rel = root.strip_prefix(base).unwrap_or(root);
            return Ok(match self.matcher.evaluate(rel, false, false) {
                MatchDecision::IndexCandidate => vec![root.to_path_buf()],
                _ => Vec::new(),
            });
        }

        let mut candidates = Vec::new();
        let matcher = &self.matcher;

        let walker = WalkDir::new(root)
            .follow_links(self.follow_links)
            .into_iter()
            .filter_entry(|entry| {
                let rel = entry.path().strip_prefix(base).unwrap_or(entry.path());
                let is_base = rel.as_os_str().is_empty();
                let decision = matcher.evaluate(rel, entry.file_type().is_dir(), is_base);
                decision != MatchDecision::Skip
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    // Unreadable subdirectories are logged and skipped; they
                    // never abort the enumeration of the rest of the tree.
                    tracing::warn!("skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };
            if entry.file_type().is_file() {
                candidates.push(entry.into_path());
            }
        }

        Ok(candidates)
    }
}
