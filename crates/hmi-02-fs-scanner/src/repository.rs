//! # Repository Area Statistics
//!
//! Recursive file counts, sizes and extension histograms for the monitored
//! repository areas. Traversal runs on the blocking pool via `walkdir`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use shared_types::{DirectoryStats, REPOSITORY_AREAS};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Directory names never descended into besides hidden ones.
const SKIPPED_DIRS: [&str; 1] = ["node_modules"];

pub struct RepositoryScanner {
    base: PathBuf,
}

impl RepositoryScanner {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base_path(&self) -> &Path {
        &self.base
    }

    /// Statistics for one area. A missing or unreadable area yields zeroed
    /// stats stamped with the current time.
    pub async fn scan_area(&self, relative: &str) -> DirectoryStats {
        let root = self.base.join(relative);
        let path = relative.to_string();

        let joined = tokio::task::spawn_blocking({
            let path = path.clone();
            move || collect_stats(&root, path)
        })
        .await;

        match joined {
            Ok(Some(stats)) => stats,
            Ok(None) => {
                debug!(area = %path, "Area not readable, reporting empty stats");
                DirectoryStats::empty(path, Utc::now())
            }
            Err(e) => {
                warn!(area = %path, error = %e, "Area scan task failed");
                DirectoryStats::empty(path, Utc::now())
            }
        }
    }

    /// Statistics for every monitored area, in area table order.
    pub async fn scan_all_areas(&self) -> Vec<DirectoryStats> {
        let mut results = Vec::with_capacity(REPOSITORY_AREAS.len());
        for area in &REPOSITORY_AREAS {
            results.push(self.scan_area(area.path).await);
        }
        results
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}

fn extension_key(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    crate::entry::extension(&name)
        .map(|ext| ext.to_lowercase())
        .unwrap_or_else(|| "no-extension".to_string())
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::from(std::time::UNIX_EPOCH)
}

/// `None` when the root itself cannot be read.
fn collect_stats(root: &Path, path: String) -> Option<DirectoryStats> {
    if !root.is_dir() {
        return None;
    }

    let mut file_count = 0u64;
    let mut total_size = 0u64;
    let mut newest: Option<DateTime<Utc>> = None;
    let mut file_types: BTreeMap<String, u64> = BTreeMap::new();

    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e));

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!(error = %e, "Skipping unreadable path");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(metadata) = entry.metadata() else {
            continue;
        };

        file_count += 1;
        total_size += metadata.len();
        if let Ok(modified) = metadata.modified() {
            let modified = DateTime::<Utc>::from(modified);
            if newest.map_or(true, |n| modified > n) {
                newest = Some(modified);
            }
        }
        *file_types.entry(extension_key(entry.path())).or_insert(0) += 1;
    }

    Some(DirectoryStats {
        path,
        file_count,
        total_size,
        last_modified: newest.unwrap_or_else(epoch),
        file_types,
    })
}
