use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{FsError, FsResult};
use crate::traits::{normalize, DirEntry, FileSystem};

/// Filesystem scope rooted at a directory on the local disk.
#[derive(Clone, Debug)]
pub struct LocalFs {
    root: PathBuf,
}

impl LocalFs {
    /// Scope rooted at `root`. The directory does not need to exist yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The scope root on disk.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full(&self, path: &str) -> FsResult<PathBuf> {
        let rel = normalize(path)?;
        if rel.is_empty() {
            return Ok(self.root.clone());
        }
        Ok(rel.split('/').fold(self.root.clone(), |p, e| p.join(e)))
    }
}

impl FileSystem for LocalFs {
    fn read_dir(&self, path: &str) -> FsResult<Vec<DirEntry>> {
        let full = self.full(path)?;
        if full.is_file() {
            return Err(FsError::NotADirectory(path.to_string()));
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&full).map_err(|e| FsError::io(path, e))? {
            let entry = entry.map_err(|e| FsError::io(path, e))?;
            let file_type = entry.file_type().map_err(|e| FsError::io(path, e))?;
            let name = entry
                .file_name()
                .into_string()
                .map_err(|raw| FsError::InvalidPath(format!("{raw:?} is not UTF-8")))?;
            entries.push(DirEntry {
                name,
                is_dir: file_type.is_dir(),
            });
        }
        entries.sort();
        Ok(entries)
    }

    fn open(&self, path: &str) -> FsResult<Box<dyn Read + Send>> {
        let file = File::open(self.full(path)?).map_err(|e| FsError::io(path, e))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn create(&self, path: &str) -> FsResult<Box<dyn Write + Send>> {
        let full = self.full(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| FsError::io(path, e))?;
        }
        let file = File::create(&full).map_err(|e| FsError::io(path, e))?;
        debug!(path = %full.display(), "created file");
        Ok(Box::new(BufWriter::new(file)))
    }

    fn create_dir(&self, path: &str) -> FsResult<()> {
        fs::create_dir_all(self.full(path)?).map_err(|e| FsError::io(path, e))
    }

    fn exists(&self, path: &str) -> FsResult<bool> {
        Ok(self.full(path)?.exists())
    }

    fn is_dir(&self, path: &str) -> FsResult<bool> {
        Ok(self.full(path)?.is_dir())
    }

    fn remove(&self, path: &str) -> FsResult<()> {
        fs::remove_file(self.full(path)?).map_err(|e| FsError::io(path, e))
    }

    fn remove_dir(&self, path: &str) -> FsResult<()> {
        fs::remove_dir(self.full(path)?).map_err(|e| FsError::io(path, e))
    }

    fn sub(&self, path: &str) -> FsResult<Arc<dyn FileSystem>> {
        Ok(Arc::new(Self::new(self.full(path)?)))
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }

    fn walk(&self, path: &str, visit: &mut dyn FnMut(&str) -> FsResult<()>) -> FsResult<()> {
        let start = self.full(path)?;
        if !start.is_dir() {
            return Err(FsError::NotFound(path.to_string()));
        }
        for entry in WalkDir::new(&start).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let at = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| path.to_string());
                match e.into_io_error() {
                    Some(io) => FsError::io(at, io),
                    None => FsError::InvalidPath(format!("{at}: filesystem loop")),
                }
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|_| FsError::InvalidPath(entry.path().display().to_string()))?;
            let parts: Vec<&str> = rel
                .components()
                .map(|c| {
                    c.as_os_str()
                        .to_str()
                        .ok_or_else(|| FsError::InvalidPath(format!("{} is not UTF-8", rel.display())))
                })
                .collect::<FsResult<_>>()?;
            visit(&parts.join("/"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_makes_parents() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFs::new(dir.path());
        fs.write_all("a/b/c.txt", b"data").unwrap();
        assert!(dir.path().join("a/b/c.txt").is_file());
        assert_eq!(fs.read_all("a/b/c.txt").unwrap(), b"data");
    }

    #[test]
    fn read_dir_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFs::new(dir.path());
        fs.write_all("z.txt", b"").unwrap();
        fs.write_all("a.txt", b"").unwrap();
        fs.create_dir("m").unwrap();
        let names: Vec<String> = fs.read_dir("").unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["a.txt", "m", "z.txt"]);
    }

    #[test]
    fn missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFs::new(dir.path());
        assert!(fs.open("nope").err().unwrap().is_not_found());
        assert!(fs.read_dir("nope").unwrap_err().is_not_found());
        assert!(!fs.exists("nope").unwrap());
    }

    #[test]
    fn walk_from_sub_scope() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFs::new(dir.path());
        fs.write_all("obj/v1/content/b.txt", b"b").unwrap();
        fs.write_all("obj/v1/content/a/x.txt", b"x").unwrap();
        fs.write_all("obj/inventory.json", b"{}").unwrap();

        let obj = fs.sub("obj").unwrap();
        let mut seen = Vec::new();
        obj.walk("v1", &mut |p| {
            seen.push(p.to_string());
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, vec!["v1/content/a/x.txt", "v1/content/b.txt"]);
    }

    #[test]
    fn remove_file() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFs::new(dir.path());
        fs.write_all("f", b"1").unwrap();
        fs.remove("f").unwrap();
        assert!(!fs.exists("f").unwrap());
    }

    #[test]
    fn remove_empty_dir_only() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFs::new(dir.path());
        fs.write_all("d/f", b"1").unwrap();
        assert!(fs.remove_dir("d").is_err());
        fs.remove("d/f").unwrap();
        fs.remove_dir("d").unwrap();
        assert!(!fs.exists("d").unwrap());
    }

    #[test]
    fn rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFs::new(dir.path());
        assert!(matches!(fs.open("../x"), Err(FsError::InvalidPath(_))));
    }
}
