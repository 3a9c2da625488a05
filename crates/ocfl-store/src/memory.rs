use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, RwLock};

use crate::error::{FsError, FsResult};
use crate::traits::{join, normalize, DirEntry, FileSystem};

#[derive(Debug, Default)]
struct Tree {
    files: BTreeMap<String, Vec<u8>>,
    /// Explicitly created directories. Directories that hold files exist
    /// implicitly.
    dirs: BTreeSet<String>,
}

impl Tree {
    fn is_dir(&self, path: &str) -> bool {
        if path.is_empty() {
            return true;
        }
        let prefix = format!("{path}/");
        self.dirs.contains(path)
            || self
                .files
                .range(prefix.clone()..)
                .next()
                .is_some_and(|(k, _)| k.starts_with(&prefix))
            || self
                .dirs
                .range(prefix.clone()..)
                .next()
                .is_some_and(|d| d.starts_with(&prefix))
    }
}

/// In-memory filesystem.
///
/// Intended for tests and embedding. The tree is shared between a scope and
/// every scope derived from it with [`FileSystem::sub`], so writes through
/// one are visible through the others.
#[derive(Clone, Debug, Default)]
pub struct MemoryFs {
    tree: Arc<RwLock<Tree>>,
    prefix: String,
}

impl MemoryFs {
    /// Create a new empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files across the whole shared tree.
    pub fn len(&self) -> usize {
        self.tree.read().expect("lock poisoned").files.len()
    }

    /// Returns `true` if the shared tree holds no files.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every file path visible from this scope, sorted.
    pub fn paths(&self) -> Vec<String> {
        let tree = self.tree.read().expect("lock poisoned");
        tree.files
            .keys()
            .filter_map(|k| self.strip(k))
            .collect()
    }

    fn full(&self, path: &str) -> FsResult<String> {
        Ok(join_prefix(&self.prefix, &normalize(path)?))
    }

    fn strip(&self, full: &str) -> Option<String> {
        if self.prefix.is_empty() {
            return Some(full.to_string());
        }
        full.strip_prefix(&self.prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .map(str::to_string)
    }
}

fn join_prefix(prefix: &str, path: &str) -> String {
    match (prefix.is_empty(), path.is_empty()) {
        (true, _) => path.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}/{path}"),
    }
}

impl FileSystem for MemoryFs {
    fn read_dir(&self, path: &str) -> FsResult<Vec<DirEntry>> {
        let full = self.full(path)?;
        let tree = self.tree.read().expect("lock poisoned");
        if tree.files.contains_key(&full) {
            return Err(FsError::NotADirectory(path.to_string()));
        }
        if !tree.is_dir(&full) {
            return Err(FsError::NotFound(path.to_string()));
        }

        let prefix = if full.is_empty() {
            String::new()
        } else {
            format!("{full}/")
        };
        let mut entries: BTreeMap<String, bool> = BTreeMap::new();
        let children = tree
            .files
            .keys()
            .map(|k| (k, false))
            .chain(tree.dirs.iter().map(|d| (d, true)));
        for (key, explicit_dir) in children {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            match rest.split_once('/') {
                Some((name, _)) => {
                    entries.insert(name.to_string(), true);
                }
                None => {
                    let is_dir = entries.get(rest).copied().unwrap_or(false) || explicit_dir;
                    entries.insert(rest.to_string(), is_dir);
                }
            }
        }
        Ok(entries
            .into_iter()
            .map(|(name, is_dir)| DirEntry { name, is_dir })
            .collect())
    }

    fn open(&self, path: &str) -> FsResult<Box<dyn Read + Send>> {
        let full = self.full(path)?;
        let tree = self.tree.read().expect("lock poisoned");
        match tree.files.get(&full) {
            Some(data) => Ok(Box::new(Cursor::new(data.clone()))),
            None => Err(FsError::NotFound(path.to_string())),
        }
    }

    fn create(&self, path: &str) -> FsResult<Box<dyn Write + Send>> {
        let full = self.full(path)?;
        if full.is_empty() {
            return Err(FsError::InvalidPath("cannot create the scope root".into()));
        }
        {
            let mut tree = self.tree.write().expect("lock poisoned");
            if tree.is_dir(&full) {
                return Err(FsError::InvalidPath(format!("{path} is a directory")));
            }
            tree.files.insert(full.clone(), Vec::new());
        }
        Ok(Box::new(MemoryFile {
            tree: Arc::clone(&self.tree),
            path: full,
            buf: Vec::new(),
        }))
    }

    fn create_dir(&self, path: &str) -> FsResult<()> {
        let full = self.full(path)?;
        if full.is_empty() {
            return Ok(());
        }
        let mut tree = self.tree.write().expect("lock poisoned");
        if tree.files.contains_key(&full) {
            return Err(FsError::NotADirectory(path.to_string()));
        }
        tree.dirs.insert(full);
        Ok(())
    }

    fn exists(&self, path: &str) -> FsResult<bool> {
        let full = self.full(path)?;
        let tree = self.tree.read().expect("lock poisoned");
        Ok(tree.files.contains_key(&full) || tree.is_dir(&full))
    }

    fn is_dir(&self, path: &str) -> FsResult<bool> {
        let full = self.full(path)?;
        Ok(self.tree.read().expect("lock poisoned").is_dir(&full))
    }

    fn remove(&self, path: &str) -> FsResult<()> {
        let full = self.full(path)?;
        let mut tree = self.tree.write().expect("lock poisoned");
        match tree.files.remove(&full) {
            Some(_) => Ok(()),
            None => Err(FsError::NotFound(path.to_string())),
        }
    }

    fn remove_dir(&self, path: &str) -> FsResult<()> {
        let full = self.full(path)?;
        if full.is_empty() {
            return Err(FsError::InvalidPath("cannot remove the scope root".into()));
        }
        let mut tree = self.tree.write().expect("lock poisoned");
        if !tree.is_dir(&full) {
            return Err(FsError::NotFound(path.to_string()));
        }
        let prefix = format!("{full}/");
        let occupied = tree.files.keys().any(|k| k.starts_with(&prefix))
            || tree.dirs.iter().any(|d| d.starts_with(&prefix));
        if occupied {
            return Err(FsError::InvalidPath(format!("{path} is not empty")));
        }
        tree.dirs.remove(&full);
        Ok(())
    }

    fn sub(&self, path: &str) -> FsResult<Arc<dyn FileSystem>> {
        Ok(Arc::new(Self {
            tree: Arc::clone(&self.tree),
            prefix: self.full(path)?,
        }))
    }

    fn location(&self) -> String {
        format!("mem:/{}", self.prefix)
    }

    fn walk(&self, path: &str, visit: &mut dyn FnMut(&str) -> FsResult<()>) -> FsResult<()> {
        let base = normalize(path)?;
        if !self.is_dir(&base)? {
            return Err(FsError::NotFound(path.to_string()));
        }
        let full = join_prefix(&self.prefix, &base);
        let prefix = if full.is_empty() {
            String::new()
        } else {
            format!("{full}/")
        };
        // Snapshot so the visitor may write to the tree.
        let keys: Vec<String> = {
            let tree = self.tree.read().expect("lock poisoned");
            tree.files
                .keys()
                .filter(|k| k.starts_with(&prefix))
                .filter_map(|k| self.strip(k))
                .collect()
        };
        for key in keys {
            visit(&key)?;
        }
        Ok(())
    }
}

/// Writer that commits its buffer into the tree on flush and on drop.
struct MemoryFile {
    tree: Arc<RwLock<Tree>>,
    path: String,
    buf: Vec<u8>,
}

impl MemoryFile {
    fn commit(&self) {
        let mut tree = self.tree.write().expect("lock poisoned");
        tree.files.insert(self.path.clone(), self.buf.clone());
    }
}

impl Write for MemoryFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.commit();
        Ok(())
    }
}

impl Drop for MemoryFile {
    fn drop(&mut self) {
        self.commit();
    }
}
