//! # Directory Scanner
//!
//! Lists, reads, mutates and searches the tree under a fixed base directory.
//!
//! ## Cache contract
//!
//! - Two scans of the same path inside the TTL return the cached listing
//!   without touching the file system.
//! - Every mutation invalidates the parent directory of the touched path and
//!   all of its ancestors. Deleting a directory also drops cached scans of
//!   anything below it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use regex::{Regex, RegexBuilder};
use shared_types::{DirectoryStructure, FilePathItem};
use tracing::{debug, warn};

use crate::cache::{CacheStats, ScanCache, DEFAULT_SCAN_TTL};
use crate::entry::build_entry;
use crate::error::ScanError;
use crate::paths::{self, ROOT};

/// Largest file returned by [`DirectoryScanner::read_file`].
pub const MAX_READ_BYTES: u64 = 1024 * 1024;

pub struct DirectoryScanner {
    base: PathBuf,
    cache: ScanCache,
    max_read_bytes: u64,
}

impl DirectoryScanner {
    /// Scanner rooted at `base` with the default 5 second TTL.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self::with_ttl(base, DEFAULT_SCAN_TTL)
    }

    pub fn with_ttl(base: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            base: base.into(),
            cache: ScanCache::new(ttl),
            max_read_bytes: MAX_READ_BYTES,
        }
    }

    /// Override the read limit used by [`read_file`](Self::read_file).
    pub fn with_max_read_bytes(mut self, limit: u64) -> Self {
        self.max_read_bytes = limit;
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base
    }

    fn resolve(&self, relative: &str) -> Result<(String, PathBuf), ScanError> {
        let normalized = paths::normalize(relative)?;
        let full = if normalized == ROOT {
            self.base.clone()
        } else {
            self.base.join(&normalized)
        };
        Ok((normalized, full))
    }

    async fn metadata(&self, normalized: &str, full: &Path) -> Result<std::fs::Metadata, ScanError> {
        tokio::fs::metadata(full)
            .await
            .map_err(|e| ScanError::io(normalized, e))
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// List the immediate children of a directory.
    ///
    /// Files and directories are each sorted by name. `total_size` and
    /// `total_files` cover direct files only.
    pub async fn scan(&self, path: &str) -> Result<DirectoryStructure, ScanError> {
        let (normalized, full) = self.resolve(path)?;

        if let Some(cached) = self.cache.get(&normalized) {
            debug!(path = %normalized, "Scan served from cache");
            return Ok(cached);
        }

        let epoch = self.cache.epoch();
        let structure = self.read_directory(&normalized, &full).await?;
        if !self.cache.insert_if_current(&normalized, epoch, structure.clone()) {
            debug!(path = %normalized, "Scan not cached, tree changed during read");
        }
        Ok(structure)
    }

    async fn read_directory(
        &self,
        normalized: &str,
        full: &Path,
    ) -> Result<DirectoryStructure, ScanError> {
        let metadata = self.metadata(normalized, full).await?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(normalized.to_string()));
        }

        let mut reader = tokio::fs::read_dir(full)
            .await
            .map_err(|e| ScanError::io(normalized, e))?;

        let mut files = Vec::new();
        let mut directories = Vec::new();
        let mut total_size = 0u64;

        while let Some(dirent) = reader
            .next_entry()
            .await
            .map_err(|e| ScanError::io(normalized, e))?
        {
            let name = dirent.file_name().to_string_lossy().into_owned();
            let child_rel = paths::join(normalized, &name);
            let child_full = dirent.path();

            // Follows symlinks; a dangling link is skipped.
            let child_meta = match tokio::fs::metadata(&child_full).await {
                Ok(meta) => meta,
                Err(e) => {
                    warn!(path = %child_rel, error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            let item = build_entry(&child_rel, &child_full, &child_meta).await?;
            if item.is_dir() {
                directories.push(item);
            } else {
                total_size += item.size;
                files.push(item);
            }
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        directories.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(DirectoryStructure {
            path: normalized.to_string(),
            name: paths::display_name(normalized).to_string(),
            total_files: files.len(),
            files,
            directories,
            total_size,
            last_modified: Utc::now(),
        })
    }

    /// Read a text file of at most the configured size.
    pub async fn read_file(&self, path: &str) -> Result<String, ScanError> {
        let (normalized, full) = self.resolve(path)?;
        let metadata = self.metadata(&normalized, &full).await?;

        if !metadata.is_file() {
            return Err(ScanError::NotAFile(normalized));
        }
        if metadata.len() > self.max_read_bytes {
            return Err(ScanError::FileTooLarge {
                path: normalized,
                size: metadata.len(),
                limit: self.max_read_bytes,
            });
        }

        let bytes = tokio::fs::read(&full)
            .await
            .map_err(|e| ScanError::io(&normalized, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Describe a single file or directory.
    pub async fn path_stats(&self, path: &str) -> Result<FilePathItem, ScanError> {
        let (normalized, full) = self.resolve(path)?;
        let metadata = self.metadata(&normalized, &full).await?;
        build_entry(&normalized, &full, &metadata).await
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Create a directory and any missing parents.
    pub async fn create_directory(&self, path: &str) -> Result<(), ScanError> {
        let (normalized, full) = self.resolve(path)?;
        tokio::fs::create_dir_all(&full)
            .await
            .map_err(|e| ScanError::io(&normalized, e))?;
        self.invalidate_after_write(&normalized);
        debug!(path = %normalized, "Directory created");
        Ok(())
    }

    /// Write a file, creating parent directories as needed.
    pub async fn write_file(&self, path: &str, content: &str) -> Result<(), ScanError> {
        let (normalized, full) = self.resolve(path)?;
        if normalized == ROOT {
            return Err(ScanError::NotAFile(normalized));
        }
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ScanError::io(&normalized, e))?;
        }
        tokio::fs::write(&full, content)
            .await
            .map_err(|e| ScanError::io(&normalized, e))?;
        self.invalidate_after_write(&normalized);
        debug!(path = %normalized, bytes = content.len(), "File written");
        Ok(())
    }

    /// Delete a file, or a directory together with its contents.
    pub async fn delete(&self, path: &str) -> Result<(), ScanError> {
        let (normalized, full) = self.resolve(path)?;
        if normalized == ROOT {
            return Err(ScanError::OutsideBase(path.to_string()));
        }
        let metadata = tokio::fs::symlink_metadata(&full)
            .await
            .map_err(|e| ScanError::io(&normalized, e))?;

        let removed = if metadata.is_dir() {
            tokio::fs::remove_dir_all(&full).await
        } else {
            tokio::fs::remove_file(&full).await
        };
        removed.map_err(|e| ScanError::io(&normalized, e))?;

        self.cache.invalidate_descendants(&normalized);
        self.cache.invalidate_with_ancestors(&normalized);
        debug!(path = %normalized, "Deleted");
        Ok(())
    }

    /// Copy a file, creating the destination's parent directories.
    pub async fn copy_file(&self, source: &str, destination: &str) -> Result<(), ScanError> {
        let (source_rel, source_full) = self.resolve(source)?;
        let (dest_rel, dest_full) = self.resolve(destination)?;

        let metadata = self.metadata(&source_rel, &source_full).await?;
        if !metadata.is_file() {
            return Err(ScanError::NotAFile(source_rel));
        }
        if let Some(parent) = dest_full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ScanError::io(&dest_rel, e))?;
        }
        tokio::fs::copy(&source_full, &dest_full)
            .await
            .map_err(|e| ScanError::io(&dest_rel, e))?;
        self.invalidate_after_write(&dest_rel);
        debug!(from = %source_rel, to = %dest_rel, "File copied");
        Ok(())
    }

    /// Invalidate the directory containing `path` and all of its ancestors.
    fn invalidate_after_write(&self, path: &str) {
        self.cache.invalidate_with_ancestors(paths::parent(path));
    }

    // =========================================================================
    // SEARCH
    // =========================================================================

    /// Recursive case-insensitive regex search over file names and paths.
    ///
    /// Hidden directories are not descended into. A directory that cannot be
    /// read, `root` included, is logged and skipped. Only a bad pattern or a
    /// path outside the base is an error. Results are in pre-order: a directory's files, then each
    /// sub-directory's results in name order.
    pub async fn search(&self, pattern: &str, root: &str) -> Result<Vec<FilePathItem>, ScanError> {
        let regex = compile_pattern(pattern)?;
        let root = paths::normalize(root)?;

        let mut results = Vec::new();
        let first = match self.scan(&root).await {
            Ok(structure) => structure,
            Err(e) => {
                warn!(path = %root, pattern, error = %e, "Search root unreadable");
                return Ok(results);
            }
        };
        let mut stack = vec![first];

        while let Some(structure) = stack.pop() {
            results.extend(
                structure
                    .files
                    .into_iter()
                    .filter(|f| regex.is_match(&f.name) || regex.is_match(&f.path)),
            );

            let mut children = Vec::new();
            for dir in structure.directories.iter().filter(|d| !d.is_hidden) {
                match self.scan(&dir.path).await {
                    Ok(child) => children.push(child),
                    Err(e) => {
                        warn!(path = %dir.path, pattern, error = %e, "Search skipped directory");
                    }
                }
            }
            // Reverse so the first directory is popped first.
            stack.extend(children.into_iter().rev());
        }

        Ok(results)
    }

    // =========================================================================
    // CACHE CONTROL
    // =========================================================================

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, ScanError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| ScanError::InvalidPattern(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, DirectoryScanner) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        fs::create_dir(dir.path().join(".hidden")).unwrap();
        fs::write(dir.path().join(".hidden/b.txt"), "beta").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/c.txt"), "gamma").unwrap();
        let scanner = DirectoryScanner::new(dir.path());
        (dir, scanner)
    }

    #[tokio::test]
    async fn test_scan_lists_children() {
        let (_dir, scanner) = fixture();
        let root = scanner.scan(".").await.unwrap();

        assert_eq!(root.name, "root");
        assert_eq!(root.total_files, 1);
        assert_eq!(root.total_size, 5);
        let dirs: Vec<_> = root.directories.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(dirs, vec![".hidden", "sub"]);
        assert!(root.directories[0].is_hidden);

        let file = &root.files[0];
        assert_eq!(file.path, "a.txt");
        assert_eq!(file.depth, 1);
        assert_eq!(file.extension.as_deref(), Some(".txt"));
        assert!(file.checksum.is_some());
        assert_eq!(file.permissions.len(), 9);
    }

    #[tokio::test]
    async fn test_scan_errors() {
        let (_dir, scanner) = fixture();
        assert!(matches!(scanner.scan("missing").await, Err(ScanError::NotFound(_))));
        assert!(matches!(scanner.scan("a.txt").await, Err(ScanError::NotADirectory(_))));
        assert!(matches!(scanner.scan("../..").await, Err(ScanError::OutsideBase(_))));
    }

    #[tokio::test]
    async fn test_cached_scan_ignores_direct_disk_changes() {
        let (dir, scanner) = fixture();
        let first = scanner.scan("sub").await.unwrap();

        // Written behind the scanner's back: not visible within the TTL.
        fs::write(dir.path().join("sub/d.txt"), "delta").unwrap();
        let second = scanner.scan("sub").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(scanner.cache_stats().hits, 1);
    }

    #[tokio::test]
    async fn test_expired_scan_rereads() {
        let dir = tempfile::tempdir().unwrap();
        let scanner = DirectoryScanner::with_ttl(dir.path(), Duration::from_millis(50));
        assert_eq!(scanner.scan(".").await.unwrap().total_files, 0);

        fs::write(dir.path().join("late.txt"), "x").unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(scanner.scan(".").await.unwrap().total_files, 1);
    }

    #[tokio::test]
    async fn test_write_invalidates_directory_and_ancestors() {
        let (_dir, scanner) = fixture();
        scanner.create_directory("sub/deep").await.unwrap();
        scanner.scan(".").await.unwrap();
        scanner.scan("sub").await.unwrap();
        scanner.scan("sub/deep").await.unwrap();
        assert_eq!(scanner.cache_size(), 3);

        scanner.write_file("sub/deep/new.txt", "fresh").await.unwrap();

        assert_eq!(scanner.cache_size(), 0);
        let deep = scanner.scan("sub/deep").await.unwrap();
        assert_eq!(deep.files.len(), 1);
        assert_eq!(deep.files[0].name, "new.txt");
    }

    #[tokio::test]
    async fn test_write_leaves_unrelated_entries() {
        let (_dir, scanner) = fixture();
        scanner.scan("sub").await.unwrap();
        scanner.scan(".hidden").await.unwrap();

        scanner.write_file("sub/x.txt", "x").await.unwrap();

        assert_eq!(scanner.cache_size(), 1);
        assert_eq!(scanner.scan("sub").await.unwrap().total_files, 2);
    }

    #[tokio::test]
    async fn test_delete_directory_drops_subtree_cache() {
        let (dir, scanner) = fixture();
        scanner.scan("sub").await.unwrap();
        scanner.scan(".").await.unwrap();

        scanner.delete("sub").await.unwrap();

        assert!(!dir.path().join("sub").exists());
        assert_eq!(scanner.cache_size(), 0);
        let root = scanner.scan(".").await.unwrap();
        assert!(root.directories.iter().all(|d| d.name != "sub"));
    }

    #[tokio::test]
    async fn test_delete_root_rejected() {
        let (_dir, scanner) = fixture();
        assert!(matches!(scanner.delete(".").await, Err(ScanError::OutsideBase(_))));
    }

    #[tokio::test]
    async fn test_copy_file() {
        let (dir, scanner) = fixture();
        scanner.copy_file("a.txt", "copies/a.txt").await.unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("copies/a.txt")).unwrap(), "alpha");
        assert!(matches!(
            scanner.copy_file("sub", "elsewhere").await,
            Err(ScanError::NotAFile(_))
        ));
    }

    #[tokio::test]
    async fn test_read_file_limits() {
        let (dir, scanner) = fixture();
        assert_eq!(scanner.read_file("sub/c.txt").await.unwrap(), "gamma");
        assert!(matches!(scanner.read_file("sub").await, Err(ScanError::NotAFile(_))));

        fs::write(dir.path().join("big.bin"), vec![b'x'; 32]).unwrap();
        let small = DirectoryScanner::new(dir.path()).with_max_read_bytes(16);
        assert!(matches!(
            small.read_file("big.bin").await,
            Err(ScanError::FileTooLarge { size: 32, limit: 16, .. })
        ));
    }

    #[tokio::test]
    async fn test_path_stats() {
        let (_dir, scanner) = fixture();
        let stats = scanner.path_stats("sub").await.unwrap();
        assert!(stats.is_dir());
        assert!(stats.checksum.is_none());
        assert!(matches!(scanner.path_stats("nope").await, Err(ScanError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_search_excludes_hidden_directories() {
        let (_dir, scanner) = fixture();
        let results = scanner.search(".", ".").await.unwrap();
        let found: Vec<_> = results.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(found, vec!["a.txt", "sub/c.txt"]);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_on_path() {
        let (_dir, scanner) = fixture();
        let results = scanner.search("SUB/", ".").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "c.txt");
    }

    #[tokio::test]
    async fn test_search_invalid_pattern() {
        let (_dir, scanner) = fixture();
        assert!(matches!(
            scanner.search("(", ".").await,
            Err(ScanError::InvalidPattern(_))
        ));
    }

    #[tokio::test]
    async fn test_search_missing_root_is_empty() {
        let (_dir, scanner) = fixture();
        assert!(scanner.search("x", "missing").await.unwrap().is_empty());
        assert!(scanner.search("x", "a.txt").await.unwrap().is_empty());
        assert!(matches!(
            scanner.search("x", "../outside").await,
            Err(ScanError::OutsideBase(_))
        ));
    }

    #[tokio::test]
    async fn test_write_during_scan_is_seen_by_next_scan() {
        let (dir, scanner) = fixture();
        fs::create_dir(dir.path().join("big")).unwrap();
        for i in 0..400 {
            fs::write(dir.path().join(format!("big/f{i:04}.txt")), vec![b'x'; 4096]).unwrap();
        }

        for delay_ms in [0, 1, 5, 20] {
            let name = format!("big/new_{delay_ms}.txt");
            let (scanned, written) = tokio::join!(scanner.scan("big"), async {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                scanner.write_file(&name, "late").await
            });
            scanned.unwrap();
            written.unwrap();

            let after = scanner.scan("big").await.unwrap();
            assert!(
                after.files.iter().any(|f| f.path == name),
                "listing after write is missing {name}"
            );
        }
    }
}
