//! Directory scanner for CI artifact trees.
//!
//! Jenkins unpacks artifacts as `<root>/<job>/<file>`; the scanner walks
//! exactly that depth and filters file names, returning paths in sorted
//! order so reports are stable between runs.

use crate::error::{CollectError, CollectResult};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Configuration for artifact scanning.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Required file name prefix (e.g. `nosetests-`).
    pub prefix: Option<String>,
    /// Required file name suffix (e.g. `.xml`).
    pub suffix: Option<String>,
    /// Depth of the files below the root.
    pub depth: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            prefix: None,
            suffix: None,
            depth: 2,
        }
    }
}

impl ScanConfig {
    /// Matches `*/nosetests-*.xml`.
    pub fn xunit() -> Self {
        Self {
            prefix: Some("nosetests-".to_string()),
            suffix: Some(".xml".to_string()),
            ..Self::default()
        }
    }

    /// Matches `*/*`.
    pub fn any_file() -> Self {
        Self::default()
    }
}

/// Scanner over one artifact root.
pub struct ArtifactScanner {
    config: ScanConfig,
    root: PathBuf,
}

impl ArtifactScanner {
    pub fn new(root: impl Into<PathBuf>, config: ScanConfig) -> Self {
        Self {
            config,
            root: root.into(),
        }
    }

    /// Scan for matching files.
    ///
    /// A missing root is reported as [`CollectError::Absent`]; the caller's
    /// absence policy decides what that means.
    pub fn scan(&self) -> CollectResult<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(CollectError::Absent(self.root.clone()));
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root)
            .min_depth(self.config.depth)
            .max_depth(self.config.depth)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!("Skipping unreadable entry under {}: {}", self.root.display(), e);
                    continue;
                }
            };

            if entry.file_type().is_file() && self.matches(entry.path()) {
                files.push(entry.into_path());
            }
        }

        debug!("Found {} files under {}", files.len(), self.root.display());
        Ok(files)
    }

    /// Check if a file name matches the configured prefix and suffix.
    pub fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };

        if let Some(ref prefix) = self.config.prefix {
            if !name.starts_with(prefix.as_str()) {
                return false;
            }
        }

        if let Some(ref suffix) = self.config.suffix {
            if !name.ends_with(suffix.as_str()) {
                return false;
            }
        }

        true
    }
}
