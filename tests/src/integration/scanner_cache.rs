//! # Scanner Cache Tests
//!
//! Exercises the directory scanner against a real temp directory:
//!
//! 1. **Freshness**: repeat scans inside the TTL are served from cache
//! 2. **Invalidation**: writes drop the parent and every ancestor
//! 3. **Expiry**: a stale entry is re-read from disk
//! 4. **Search**: hidden directories are never descended into

#[cfg(test)]
use std::time::Duration;

#[cfg(test)]
use hmi_02_fs_scanner::DirectoryScanner;

#[cfg(test)]
use tempfile::TempDir;

#[cfg(test)]
fn scanner() -> (TempDir, DirectoryScanner) {
    let dir = TempDir::new().unwrap();
    let scanner = DirectoryScanner::new(dir.path());
    (dir, scanner)
}

#[cfg(test)]
mod freshness {
    use super::*;

    #[tokio::test]
    async fn test_scan_within_ttl_ignores_out_of_band_changes() {
        let (dir, scanner) = scanner();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();

        let first = scanner.scan(".").await.unwrap();
        assert_eq!(first.total_files, 1);

        // Not through the scanner, so nothing is invalidated
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();

        let second = scanner.scan(".").await.unwrap();
        assert_eq!(second.total_files, 1);
        assert_eq!(scanner.cache_stats().hits, 1);
    }

    #[tokio::test]
    async fn test_stale_entry_is_reread() {
        let dir = TempDir::new().unwrap();
        let scanner = DirectoryScanner::with_ttl(dir.path(), Duration::from_millis(50));

        assert_eq!(scanner.scan(".").await.unwrap().total_files, 0);
        std::fs::write(dir.path().join("late.txt"), "late").unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;

        let rescanned = scanner.scan(".").await.unwrap();
        assert_eq!(rescanned.total_files, 1);
        assert_eq!(rescanned.files[0].name, "late.txt");
    }
}

#[cfg(test)]
mod invalidation {
    use super::*;

    #[tokio::test]
    async fn test_write_drops_parent_and_ancestors_only() {
        let (_dir, scanner) = scanner();
        scanner.create_directory("plant/line1").await.unwrap();
        scanner.create_directory("archive").await.unwrap();

        for path in [".", "plant", "plant/line1", "archive"] {
            scanner.scan(path).await.unwrap();
        }
        assert_eq!(scanner.cache_size(), 4);

        scanner
            .write_file("plant/line1/recipe.json", "{}")
            .await
            .unwrap();

        // Only the unrelated sibling survives
        assert_eq!(scanner.cache_size(), 1);
        let line = scanner.scan("plant/line1").await.unwrap();
        assert_eq!(line.files[0].name, "recipe.json");
    }

    #[tokio::test]
    async fn test_delete_directory_drops_cached_descendants() {
        let (_dir, scanner) = scanner();
        scanner.write_file("old/nested/deep.txt", "x").await.unwrap();
        scanner.scan("old/nested").await.unwrap();
        scanner.scan("old").await.unwrap();

        scanner.delete("old").await.unwrap();

        assert_eq!(scanner.cache_size(), 0);
        assert!(scanner.scan("old/nested").await.is_err());
        let root = scanner.scan(".").await.unwrap();
        assert!(root.directories.is_empty());
    }

    #[tokio::test]
    async fn test_copy_refreshes_destination_listing() {
        let (_dir, scanner) = scanner();
        scanner.write_file("src/main.plc", "LD X0").await.unwrap();
        scanner.create_directory("backup").await.unwrap();
        assert_eq!(scanner.scan("backup").await.unwrap().total_files, 0);

        scanner.copy_file("src/main.plc", "backup/main.plc").await.unwrap();

        let backup = scanner.scan("backup").await.unwrap();
        assert_eq!(backup.total_files, 1);
        assert_eq!(scanner.read_file("backup/main.plc").await.unwrap(), "LD X0");
    }
}

#[cfg(test)]
mod search {
    use super::*;

    #[tokio::test]
    async fn test_hidden_directories_are_skipped() {
        let (_dir, scanner) = scanner();
        scanner.write_file(".git/config", "[core]").await.unwrap();
        scanner.write_file("server/config.ts", "").await.unwrap();
        scanner.write_file("client/src/Config.tsx", "").await.unwrap();

        let hits = scanner.search("config", ".").await.unwrap();
        let paths: Vec<&str> = hits.iter().map(|f| f.path.as_str()).collect();

        assert_eq!(paths.len(), 2);
        assert!(paths.contains(&"server/config.ts"));
        assert!(paths.contains(&"client/src/Config.tsx"));
        assert!(!paths.iter().any(|p| p.starts_with(".git")));
    }

    #[tokio::test]
    async fn test_invalid_pattern_is_rejected() {
        let (_dir, scanner) = scanner();
        assert!(scanner.search("(unclosed", ".").await.is_err());
    }
}
