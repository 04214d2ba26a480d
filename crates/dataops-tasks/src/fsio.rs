//! Whole-file I/O helpers and data-root confinement.
//!
//! Reads load the entire file into memory; writes replace existing content.
//! [`confine`] validates a caller-supplied path against the data root purely
//! lexically, so a rejected path never reaches the filesystem.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{Result, TaskError};

/// Read a UTF-8 file fully into memory.
pub async fn read_file(path: &Path) -> Result<String> {
    debug!(path = %path.display(), "reading file");
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| TaskError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Read a binary file fully into memory.
pub async fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    debug!(path = %path.display(), "reading file bytes");
    tokio::fs::read(path).await.map_err(|source| TaskError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `content` to `path`, replacing any existing content and creating
/// missing parent directories.
pub async fn write_file(path: &Path, content: &str) -> Result<()> {
    debug!(path = %path.display(), bytes = content.len(), "writing file");
    let map_err = |source| TaskError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(map_err)?;
    }
    tokio::fs::write(path, content).await.map_err(map_err)
}

/// Validate that `raw` names a path inside `root`.
///
/// The raw string must start with the root followed by a separator, and the
/// lexically normalized path must still lie under the root (so `..`
/// segments cannot escape).  No filesystem access happens here.
pub fn confine(root: &Path, raw: &str) -> Result<PathBuf> {
    let root = normalize_path(root);
    let root_str = root.to_string_lossy();
    let prefix = format!("{}/", root_str.trim_end_matches('/'));

    let outside = || TaskError::PathOutsideRoot {
        path: raw.to_owned(),
        root: root_str.to_string(),
    };

    if !raw.starts_with(&prefix) {
        return Err(outside());
    }

    let normalized = normalize_path(Path::new(raw));
    if !normalized.starts_with(&root) || normalized == root {
        return Err(outside());
    }

    Ok(normalized)
}

/// Normalize a path by resolving `.` and `..` components without touching the
/// filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                // Pop only if there is a normal component to pop.
                if matches!(components.last(), Some(Component::Normal(_))) {
                    components.pop();
                } else if !matches!(components.last(), Some(Component::RootDir)) {
                    components.push(component);
                }
            }
            Component::CurDir => {}
            _ => components.push(component),
        }
    }
    components.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_path_resolves_parent_components() {
        let norm = normalize_path(Path::new("/data/sub/../other"));
        assert_eq!(norm, PathBuf::from("/data/other"));
    }

    #[test]
    fn normalize_path_resolves_current_dir_components() {
        let norm = normalize_path(Path::new("/data/./docs/./a.md"));
        assert_eq!(norm, PathBuf::from("/data/docs/a.md"));
    }

    #[test]
    fn normalize_path_cannot_climb_above_root() {
        assert_eq!(normalize_path(Path::new("/../etc")), PathBuf::from("/etc"));
    }

    #[test]
    fn confine_accepts_paths_under_root() {
        let path = confine(Path::new("/data"), "/data/logs/a.log").unwrap();
        assert_eq!(path, PathBuf::from("/data/logs/a.log"));
    }

    #[test]
    fn confine_rejects_other_prefixes() {
        for raw in ["/etc/passwd", "data/x", "/database/x", "/data", "", "/dat"] {
            let err = confine(Path::new("/data"), raw).unwrap_err();
            assert!(matches!(err, TaskError::PathOutsideRoot { .. }), "{raw}");
        }
    }

    #[test]
    fn confine_rejects_traversal() {
        let err = confine(Path::new("/data/"), "/data/../etc/passwd").unwrap_err();
        assert!(err.to_string().contains("outside the data root"));
    }

    #[test]
    fn confine_never_touches_the_filesystem() {
        // Neither the root nor the target exists; validation is lexical.
        let root = Path::new("/definitely/not/a/real/root");
        assert!(confine(root, "/definitely/not/a/real/root/f.txt").is_ok());
        assert!(confine(root, "/elsewhere/f.txt").is_err());
    }

    #[tokio::test]
    async fn write_then_read_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.txt");
        write_file(&path, "first").await.unwrap();
        write_file(&path, "second").await.unwrap();
        assert_eq!(read_file(&path).await.unwrap(), "second");
    }

    #[tokio::test]
    async fn read_missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");
        let err = read_file(&path).await.unwrap_err();
        assert!(matches!(err, TaskError::Read { .. }));
        assert!(err.to_string().contains("missing.txt"));
    }
}
