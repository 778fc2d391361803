//! File-system facing entities produced by the directory scanner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// A single entry in a scanned directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePathItem {
    /// Short digest of the relative path.
    pub id: String,
    pub name: String,
    /// Path relative to the scanner base, `/`-separated.
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub size: u64,
    pub modified: DateTime<Utc>,
    /// Content digest for change detection. Files only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    /// Number of path segments below the base.
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    /// `rwxr-x---` style rendering of the mode bits.
    pub permissions: String,
    pub is_hidden: bool,
}

impl FilePathItem {
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Result of scanning one directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryStructure {
    pub path: String,
    pub name: String,
    pub files: Vec<FilePathItem>,
    pub directories: Vec<FilePathItem>,
    /// Sum of file sizes (directories excluded).
    pub total_size: u64,
    pub total_files: usize,
    /// Time the scan was performed.
    pub last_modified: DateTime<Utc>,
}

/// Recursive statistics for a repository area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryStats {
    pub path: String,
    pub file_count: u64,
    pub total_size: u64,
    /// Newest file mtime in the tree.
    pub last_modified: DateTime<Utc>,
    /// Extension (with dot) to file count; `no-extension` for bare names.
    pub file_types: BTreeMap<String, u64>,
}

impl DirectoryStats {
    /// Zeroed stats for an area that could not be read.
    #[must_use]
    pub fn empty(path: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            file_count: 0,
            total_size: 0,
            last_modified: at,
            file_types: BTreeMap::new(),
        }
    }

    /// Total size in mebibytes.
    #[must_use]
    pub fn size_mb(&self) -> f64 {
        self.total_size as f64 / (1024.0 * 1024.0)
    }
}
