use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

use crate::error::{FsError, FsResult};

/// One entry of a directory listing.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct DirEntry {
    /// File or directory name, without any parent path.
    pub name: String,
    /// `true` if the entry is a directory.
    pub is_dir: bool,
}

impl DirEntry {
    /// Convenience constructor for a file entry.
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    /// Convenience constructor for a directory entry.
    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

/// A directory tree that OCFL structures are read from and written to.
///
/// All implementations must satisfy these invariants:
/// - Paths are relative to the scope root and `/`-separated. The empty path
///   (or `.`) names the scope root itself.
/// - `read_dir` returns entries sorted by name and fails with
///   [`FsError::NotFound`] when the directory does not exist.
/// - `create` makes any missing parent directories and truncates an
///   existing file.
/// - A scope returned by `sub` sees exactly the subtree below its path.
pub trait FileSystem: Send + Sync + fmt::Debug {
    /// List the direct children of a directory.
    fn read_dir(&self, path: &str) -> FsResult<Vec<DirEntry>>;

    /// Open a file for reading.
    fn open(&self, path: &str) -> FsResult<Box<dyn Read + Send>>;

    /// Create (or truncate) a file for writing.
    fn create(&self, path: &str) -> FsResult<Box<dyn Write + Send>>;

    /// Create a directory and any missing parents.
    fn create_dir(&self, path: &str) -> FsResult<()>;

    /// Returns `true` if a file or directory exists at `path`.
    fn exists(&self, path: &str) -> FsResult<bool>;

    /// Returns `true` if `path` is an existing directory.
    fn is_dir(&self, path: &str) -> FsResult<bool>;

    /// Remove a single file.
    fn remove(&self, path: &str) -> FsResult<()>;

    /// Remove an empty directory.
    fn remove_dir(&self, path: &str) -> FsResult<()>;

    /// Derive a scope rooted at `path`.
    fn sub(&self, path: &str) -> FsResult<Arc<dyn FileSystem>>;

    /// Human-readable location of the scope root, for messages.
    fn location(&self) -> String;

    /// Visit every file below `path`, depth first, in name order.
    ///
    /// The visitor receives paths relative to this scope (not to `path`).
    /// Default implementation recurses with `read_dir`.
    fn walk(&self, path: &str, visit: &mut dyn FnMut(&str) -> FsResult<()>) -> FsResult<()> {
        let base = normalize(path)?;
        for entry in self.read_dir(&base)? {
            let child = join(&base, &entry.name);
            if entry.is_dir {
                self.walk(&child, visit)?;
            } else {
                visit(&child)?;
            }
        }
        Ok(())
    }

    /// Read a whole file into memory.
    fn read_all(&self, path: &str) -> FsResult<Vec<u8>> {
        let mut reader = self.open(path)?;
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .map_err(|e| FsError::io(path, e))?;
        Ok(buf)
    }

    /// Read a whole file as UTF-8 text.
    fn read_to_string(&self, path: &str) -> FsResult<String> {
        let bytes = self.read_all(path)?;
        String::from_utf8(bytes).map_err(|_| FsError::InvalidPath(format!("{path} is not UTF-8")))
    }

    /// Write `data` to a file, replacing any previous content.
    fn write_all(&self, path: &str, data: &[u8]) -> FsResult<()> {
        let mut writer = self.create(path)?;
        writer.write_all(data).map_err(|e| FsError::io(path, e))?;
        writer.flush().map_err(|e| FsError::io(path, e))
    }
}

/// Normalize a scope-relative path.
///
/// Strips leading `./`, trailing `/`, and repeated separators. Rejects
/// absolute paths and `..` elements.
pub fn normalize(path: &str) -> FsResult<String> {
    if path.starts_with('/') || path.starts_with('\\') {
        return Err(FsError::InvalidPath(format!("{path} is absolute")));
    }
    let mut parts = Vec::new();
    for element in path.split('/') {
        match element {
            "" | "." => {}
            ".." => return Err(FsError::InvalidPath(format!("{path} leaves its scope"))),
            other => parts.push(other),
        }
    }
    Ok(parts.join("/"))
}

pub(crate) fn join(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_cleans_paths() {
        assert_eq!(normalize("").unwrap(), "");
        assert_eq!(normalize(".").unwrap(), "");
        assert_eq!(normalize("./a//b/").unwrap(), "a/b");
        assert_eq!(normalize("v1/content/a.txt").unwrap(), "v1/content/a.txt");
    }

    #[test]
    fn normalize_rejects_escapes() {
        assert!(normalize("/etc/passwd").is_err());
        assert!(normalize("a/../../b").is_err());
    }

    #[test]
    fn join_handles_root() {
        assert_eq!(join("", "a"), "a");
        assert_eq!(join("a", "b"), "a/b");
    }
}
