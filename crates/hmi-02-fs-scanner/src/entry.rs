//! Construction of [`FilePathItem`] values from file metadata.

use std::fs::Metadata;
use std::hash::Hasher;
use std::path::Path;

use chrono::{DateTime, Utc};
use shared_types::{EntryKind, FilePathItem};
use siphasher::sip128::{Hasher128, SipHasher13};
use tokio::io::AsyncReadExt;

use crate::error::ScanError;
use crate::paths;

const CHECKSUM_CHUNK: usize = 64 * 1024;

/// Short stable id derived from the relative path: 8 hex characters.
pub fn entry_id(relative_path: &str) -> String {
    let mut hasher = SipHasher13::new();
    hasher.write(relative_path.as_bytes());
    let digest = format!("{:032x}", hasher.finish128().as_u128());
    digest[..8].to_string()
}

/// Non-cryptographic content digest used for change detection.
pub async fn checksum(full_path: &Path) -> Result<String, std::io::Error> {
    let mut file = tokio::fs::File::open(full_path).await?;
    let mut hasher = SipHasher13::new();
    let mut buf = vec![0u8; CHECKSUM_CHUNK];
    loop {
        let read = file.read(&mut buf).await?;
        if read == 0 {
            break;
        }
        hasher.write(&buf[..read]);
    }
    Ok(format!("{:032x}", hasher.finish128().as_u128()))
}

/// `rwxr-x---` rendering of the permission bits.
pub fn permissions_string(mode: u32) -> String {
    const TRIPLETS: [&str; 8] = ["---", "--x", "-w-", "-wx", "r--", "r-x", "rw-", "rwx"];
    let mut out = String::with_capacity(9);
    for shift in [6, 3, 0] {
        out.push_str(TRIPLETS[((mode >> shift) & 7) as usize]);
    }
    out
}

#[cfg(unix)]
fn mode_of(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn mode_of(metadata: &Metadata) -> u32 {
    let base = if metadata.is_dir() { 0o755 } else { 0o644 };
    if metadata.permissions().readonly() {
        base & !0o222
    } else {
        base
    }
}

/// Extension including the leading dot, as long as the name has a stem.
///
/// `a.txt` gives `.txt`, while `.env` and `Makefile` give `None`.
pub fn extension(name: &str) -> Option<String> {
    let idx = name.rfind('.')?;
    if idx == 0 || idx + 1 == name.len() {
        return None;
    }
    Some(name[idx..].to_string())
}

fn modified_of(metadata: &Metadata) -> DateTime<Utc> {
    metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

/// Build an entry for `relative_path` from its metadata.
///
/// Files get a content checksum; an unreadable file yields `error` in place
/// of the digest rather than failing the whole listing.
pub async fn build_entry(
    relative_path: &str,
    full_path: &Path,
    metadata: &Metadata,
) -> Result<FilePathItem, ScanError> {
    let name = paths::display_name(relative_path).to_string();
    let is_dir = metadata.is_dir();

    let checksum = if is_dir {
        None
    } else {
        Some(
            checksum(full_path)
                .await
                .unwrap_or_else(|_| "error".to_string()),
        )
    };

    Ok(FilePathItem {
        id: entry_id(relative_path),
        extension: if is_dir { None } else { extension(&name) },
        is_hidden: name.starts_with('.'),
        name,
        path: relative_path.to_string(),
        kind: if is_dir {
            EntryKind::Directory
        } else {
            EntryKind::File
        },
        size: metadata.len(),
        modified: modified_of(metadata),
        checksum,
        depth: paths::depth(relative_path),
        permissions: permissions_string(mode_of(metadata)),
    })
}
