//! Lexical handling of scanner-relative paths.
//!
//! Every path the scanner accepts is relative to its base directory and is
//! normalized to `/`-separated segments with `.` and `..` resolved. The base
//! itself is spelled `.`. Symlinks are not resolved.

use crate::error::ScanError;

/// Spelling of the base directory.
pub const ROOT: &str = ".";

/// Normalize a client-supplied relative path.
///
/// Leading separators are ignored, so `/client` and `client` name the same
/// directory. A `..` that would climb above the base is rejected.
pub fn normalize(path: &str) -> Result<String, ScanError> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(ScanError::OutsideBase(path.to_string()));
                }
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        Ok(ROOT.to_string())
    } else {
        Ok(segments.join("/"))
    }
}

/// Parent of a normalized path; the root is its own parent.
pub fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => ROOT,
    }
}

/// Join a child name onto a normalized directory path.
pub fn join(dir: &str, name: &str) -> String {
    if dir == ROOT {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Number of segments below the base. The root has depth 0.
pub fn depth(path: &str) -> usize {
    if path == ROOT {
        0
    } else {
        path.split('/').count()
    }
}

/// Last segment, or `root` for the base directory.
pub fn display_name(path: &str) -> &str {
    if path == ROOT {
        "root"
    } else {
        path.rsplit('/').next().unwrap_or(path)
    }
}

/// The path itself followed by each ancestor up to and including the root.
///
/// ```
/// use hmi_02_fs_scanner::paths::ancestors_inclusive;
/// assert_eq!(ancestors_inclusive("a/b"), vec!["a/b", "a", "."]);
/// assert_eq!(ancestors_inclusive("."), vec!["."]);
/// ```
pub fn ancestors_inclusive(path: &str) -> Vec<&str> {
    let mut chain = vec![path];
    let mut current = path;
    while current != ROOT {
        current = parent(current);
        chain.push(current);
    }
    chain
}

/// Whether `path` lies strictly below `dir`.
pub fn is_descendant(path: &str, dir: &str) -> bool {
    if dir == ROOT {
        return path != ROOT;
    }
    path.len() > dir.len() && path.starts_with(dir) && path.as_bytes()[dir.len()] == b'/'
}
