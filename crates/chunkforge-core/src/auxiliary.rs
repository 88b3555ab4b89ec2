//! Scanner data: which blocks a scanner reveals for a given input item.
//!
//! Scanner data lives in a directory of JSON files, one mapping per file:
//!
//! ```json
//! { "inputItems": ["minecraft:coal"], "blocks": ["minecraft:coal_ore"] }
//! ```
//!
//! A reload clears every mapping and reads the directory again. A file
//! that cannot be read or parsed is logged and skipped; the rest still
//! load.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Errors raised when the data directory itself cannot be read.
#[derive(Debug, thiserror::Error)]
pub enum AuxiliaryError {
    /// Listing the directory failed.
    #[error("cannot read scanner data directory {path}: {source}")]
    ReadDir {
        /// The directory.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// One scanner data file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannerData {
    /// Items that select this mapping.
    pub input_items: Vec<String>,
    /// Blocks revealed for those items.
    #[serde(default)]
    pub blocks: Vec<String>,
}

/// Outcome of [`ScannerMappings::reload_dir`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadReport {
    /// Files loaded.
    pub loaded: usize,
    /// Files skipped because they were unreadable or malformed.
    pub failed: Vec<PathBuf>,
}

/// Item to revealed-block mappings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannerMappings {
    blocks_by_item: BTreeMap<String, BTreeSet<String>>,
}

impl ScannerMappings {
    /// Empty mappings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks revealed for `item`.
    pub fn blocks_for(&self, item: &str) -> Option<&BTreeSet<String>> {
        self.blocks_by_item.get(item)
    }

    /// Number of items with a mapping.
    pub fn len(&self) -> usize {
        self.blocks_by_item.len()
    }

    /// Whether no item has a mapping.
    pub fn is_empty(&self) -> bool {
        self.blocks_by_item.is_empty()
    }

    /// Merge one file's mapping in.
    pub fn insert(&mut self, data: ScannerData) {
        for item in data.input_items {
            self.blocks_by_item
                .entry(item)
                .or_default()
                .extend(data.blocks.iter().cloned());
        }
    }

    /// Replace all mappings with the `*.json` files in `dir`, in file name
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`AuxiliaryError::ReadDir`] only if `dir` itself cannot be
    /// listed. Individual bad files are reported in [`ReloadReport::failed`].
    pub fn reload_dir(&mut self, dir: &Path) -> Result<ReloadReport, AuxiliaryError> {
        self.blocks_by_item.clear();
        let read_dir_err = |source: std::io::Error| AuxiliaryError::ReadDir {
            path: dir.to_path_buf(),
            source,
        };
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(read_dir_err)? {
            let path = entry.map_err(read_dir_err)?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();

        let mut report = ReloadReport::default();
        for path in files {
            match read_file(&path) {
                Ok(data) => {
                    self.insert(data);
                    report.loaded = report.loaded.saturating_add(1);
                }
                Err(reason) => {
                    warn!(path = %path.display(), reason = %reason, "Failed to read scanner data");
                    report.failed.push(path);
                }
            }
        }
        info!(loaded = report.loaded, failed = report.failed.len(), "Loaded scanner data configs");
        Ok(report)
    }
}

fn read_file(path: &Path) -> Result<ScannerData, String> {
    let text = std::fs::read_to_string(path).map_err(|err| err.to_string())?;
    let data: ScannerData = serde_json::from_str(&text).map_err(|err| err.to_string())?;
    if data.input_items.is_empty() {
        return Err("no input items".to_owned());
    }
    Ok(data)
}
