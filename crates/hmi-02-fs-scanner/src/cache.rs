//! # Scan Cache
//!
//! Time-bounded cache of directory scans keyed by normalized relative path.
//!
//! An entry is served only while younger than the TTL; a stale entry is
//! evicted on lookup. Mutations invalidate the touched directory and every
//! ancestor up to the root, so no listing that could include the change
//! survives it.
//!
//! Every invalidation also bumps an epoch. A scan captures the epoch before
//! reading the disk and is only cached if no invalidation ran meanwhile, so
//! a slow read cannot re-insert a listing from before a completed mutation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use shared_types::DirectoryStructure;
use tracing::trace;

use crate::paths;

/// Default time a scan stays fresh.
pub const DEFAULT_SCAN_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
struct CachedScan {
    structure: DirectoryStructure,
    cached_at: Instant,
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

pub struct ScanCache {
    entries: DashMap<String, CachedScan>,
    ttl: Duration,
    epoch: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ScanCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            epoch: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh entry for `path`, if any.
    pub fn get(&self, path: &str) -> Option<DirectoryStructure> {
        self.get_at(path, Instant::now())
    }

    fn get_at(&self, path: &str, now: Instant) -> Option<DirectoryStructure> {
        let fresh = match self.entries.get(path) {
            Some(entry) if now.saturating_duration_since(entry.cached_at) < self.ttl => {
                Some(entry.structure.clone())
            }
            Some(_) => None,
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        match fresh {
            Some(structure) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(structure)
            }
            None => {
                trace!(path, "Evicting stale scan");
                self.entries.remove(path);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(&self, path: &str, structure: DirectoryStructure) {
        self.entries.insert(
            path.to_string(),
            CachedScan {
                structure,
                cached_at: Instant::now(),
            },
        );
    }

    /// Current invalidation epoch. Capture before reading the disk.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Insert only if no invalidation happened since `epoch` was read.
    ///
    /// The check runs under the shard lock. Invalidators bump the epoch
    /// before removing, so an insert that passes the check is removed by
    /// any invalidation that overlaps it.
    pub fn insert_if_current(&self, path: &str, epoch: u64, structure: DirectoryStructure) -> bool {
        let entry = self.entries.entry(path.to_string());
        if self.epoch.load(Ordering::SeqCst) != epoch {
            trace!(path, "Discarding scan raced by a mutation");
            return false;
        }
        entry.insert(CachedScan {
            structure,
            cached_at: Instant::now(),
        });
        true
    }

    fn bump_epoch(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    /// Drop `dir` and all of its ancestors, root included.
    pub fn invalidate_with_ancestors(&self, dir: &str) {
        self.bump_epoch();
        for path in paths::ancestors_inclusive(dir) {
            if self.entries.remove(path).is_some() {
                trace!(path, "Invalidated cached scan");
            }
        }
    }

    /// Drop every entry strictly below `dir`.
    pub fn invalidate_descendants(&self, dir: &str) {
        self.bump_epoch();
        self.entries.retain(|path, _| !paths::is_descendant(path, dir));
    }

    pub fn clear(&self) {
        self.bump_epoch();
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}

impl Default for ScanCache {
    fn default() -> Self {
        Self::new(DEFAULT_SCAN_TTL)
    }
}
