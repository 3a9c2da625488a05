//! Versioning state machine over an [`Inventory`].
//!
//! An inventory is read-only until [`Inventory::new_version`] opens a new
//! head version. Mutations then apply to that head only. Committing is the
//! caller's job: it calls [`Inventory::clean`], serializes the inventory, and
//! finally [`Inventory::finish_version`].

use std::collections::{BTreeMap, HashMap, HashSet};

use ocfl_types::path::{self, check_path};
use ocfl_types::{DigestAlgorithm, SpecVersion, VersionNumber};
use tracing::debug;

use crate::error::{InventoryError, InventoryResult};
use crate::model::{DigestMap, Inventory, User, Version};

/// Content directory name used when an inventory does not set one.
pub const DEFAULT_CONTENT_DIRECTORY: &str = "content";

impl Inventory {
    /// An empty inventory for a new object. It has no versions until
    /// [`new_version`](Self::new_version) is called.
    pub fn new(
        id: impl Into<String>,
        spec: SpecVersion,
        digest_algorithm: DigestAlgorithm,
        content_directory: Option<&str>,
    ) -> InventoryResult<Self> {
        if !digest_algorithm.is_content_addressing() {
            return Err(InventoryError::UnsupportedDigestAlgorithm(
                digest_algorithm.to_string(),
            ));
        }
        let content_directory = match content_directory {
            None => None,
            Some(DEFAULT_CONTENT_DIRECTORY) => None,
            Some(dir) if valid_content_directory(dir) => Some(dir.to_string()),
            Some(dir) => return Err(InventoryError::InvalidContentDirectory(dir.to_string())),
        };
        Ok(Self {
            id: id.into(),
            type_uri: spec.inventory_type(),
            digest_algorithm,
            head: VersionNumber::first(),
            content_directory,
            manifest: DigestMap::new(),
            versions: BTreeMap::new(),
            fixity: None,
            writable: false,
            modified: false,
            head_index: HashMap::new(),
        })
    }

    // ---------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The inventory `type` URI as stored.
    pub fn type_uri(&self) -> &str {
        &self.type_uri
    }

    /// Specification revision named by the `type` URI.
    pub fn spec_version(&self) -> InventoryResult<SpecVersion> {
        Ok(SpecVersion::from_inventory_type(&self.type_uri)?)
    }

    pub fn digest_algorithm(&self) -> DigestAlgorithm {
        self.digest_algorithm
    }

    /// The head version. Meaningless while [`is_empty`](Self::is_empty).
    pub fn head(&self) -> VersionNumber {
        self.head
    }

    /// The content directory name, `content` unless configured otherwise.
    pub fn content_directory(&self) -> &str {
        self.content_directory
            .as_deref()
            .unwrap_or(DEFAULT_CONTENT_DIRECTORY)
    }

    pub fn manifest(&self) -> &DigestMap {
        &self.manifest
    }

    pub fn versions(&self) -> &BTreeMap<VersionNumber, Version> {
        &self.versions
    }

    pub fn version(&self, version: VersionNumber) -> Option<&Version> {
        self.versions.get(&version)
    }

    /// The head version entry.
    pub fn head_version(&self) -> Option<&Version> {
        self.versions.get(&self.head)
    }

    /// Fixity block, keyed by algorithm name.
    pub fn fixity(&self) -> Option<&BTreeMap<String, DigestMap>> {
        self.fixity.as_ref()
    }

    /// Returns `true` if no version exists yet.
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Logical path to digest for `version` (head when `None`).
    pub fn files(&self, version: Option<VersionNumber>) -> BTreeMap<String, String> {
        let version = version.unwrap_or(self.head);
        self.versions
            .get(&version)
            .map(|v| {
                v.files()
                    .into_iter()
                    .map(|(p, d)| (p.to_string(), d.to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// First content path holding `digest`.
    pub fn content_path(&self, digest: &str) -> Option<&str> {
        self.manifest
            .get(&digest.to_lowercase())
            .and_then(|paths| paths.first())
            .map(String::as_str)
    }

    /// Every content path in the manifest.
    pub fn content_paths(&self) -> impl Iterator<Item = (&str, &str)> {
        self.manifest
            .iter()
            .flat_map(|(d, paths)| paths.iter().map(move |p| (p.as_str(), d.as_str())))
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// Returns `true` if content with `digest` is already stored.
    ///
    /// This looks at the manifest only; it says nothing about which logical
    /// paths use the content.
    pub fn is_duplicate(&self, digest: &str) -> bool {
        self.manifest.contains_key(&digest.to_lowercase())
    }

    /// The most recent version in which `logical` appears, with its digest.
    ///
    /// Versions are compared numerically.
    pub fn last_seen(&self, logical: &str) -> Option<(VersionNumber, &str)> {
        self.versions
            .iter()
            .rev()
            .find_map(|(v, version)| version.digest_of(logical).map(|d| (*v, d)))
    }

    /// Returns `true` if `logical` appears in any version.
    pub fn already_exists(&self, logical: &str) -> bool {
        self.last_seen(logical).is_some()
    }

    /// Returns `true` if `logical` was last seen with a digest other than
    /// `digest`.
    pub fn is_update(&self, logical: &str, digest: &str) -> bool {
        let digest = digest.to_lowercase();
        self.last_seen(logical).is_some_and(|(_, d)| d != digest)
    }

    /// Physical path for a sanitized logical path in the head version:
    /// `<head>/<contentDirectory>/<path>`.
    pub fn build_realname(&self, sanitized: &str) -> String {
        path::join(&[&self.head.to_string(), self.content_directory(), sanitized])
    }

    // ---------------------------------------------------------------
    // Version lifecycle
    // ---------------------------------------------------------------

    /// Open a new head version seeded with the state of the previous head.
    pub fn new_version(
        &mut self,
        message: &str,
        user_name: &str,
        user_address: &str,
    ) -> InventoryResult<VersionNumber> {
        if self.writable {
            return Err(InventoryError::AlreadyWritable(self.id.clone()));
        }
        let (number, state) = match self.versions.get(&self.head) {
            Some(prev) => (self.head.next()?, prev.state.clone()),
            None => (VersionNumber::first(), DigestMap::new()),
        };

        let message = (!message.is_empty()).then(|| message.to_string());
        let user = (!user_name.is_empty()).then(|| User {
            name: user_name.to_string(),
            address: (!user_address.is_empty()).then(|| user_address.to_string()),
        });
        let mut version = Version::new(message, user);
        version.state = state;

        self.versions.insert(number, version);
        self.head = number;
        self.writable = true;
        self.modified = false;
        self.rebuild_index();
        debug!(id = %self.id, version = %number, "opened version");
        Ok(number)
    }

    /// Drop the open head version if nothing changed and it is not the only
    /// version. Returns `true` if the head was dropped.
    pub fn clean(&mut self) -> InventoryResult<bool> {
        if !self.writable || self.modified || self.versions.len() < 2 {
            return Ok(false);
        }
        let Some(previous) = self.head.previous() else {
            return Ok(false);
        };
        self.versions.remove(&self.head);
        debug!(id = %self.id, dropped = %self.head, head = %previous, "discarded unmodified version");
        self.head = previous;
        self.rebuild_index();
        Ok(true)
    }

    /// Close the open version. The inventory becomes read-only.
    pub fn finish_version(&mut self) {
        self.writable = false;
        self.modified = false;
    }

    // ---------------------------------------------------------------
    // Head mutations
    // ---------------------------------------------------------------

    /// Record `logical` with content `digest` in the head version.
    ///
    /// A non-empty `physical` path is added to the manifest for `digest`.
    /// An empty one references content that is already stored. If `logical`
    /// already maps to `digest` in the head, the call changes nothing. If it
    /// maps to another digest, that mapping is replaced.
    pub fn add_file(&mut self, logical: &str, physical: &str, digest: &str) -> InventoryResult<()> {
        self.require_writable()?;
        check_path(logical).map_err(|violation| InventoryError::InvalidPath {
            path: logical.to_string(),
            violation,
        })?;
        let digest = digest.to_lowercase();
        let current = self.head_index.get(logical).cloned();

        if current.as_deref() == Some(digest.as_str()) && self.manifest.contains_key(&digest) {
            debug!(logical, %digest, "unchanged file");
            return Ok(());
        }
        if current.is_none() {
            self.check_logical_conflicts(logical)?;
        }

        if physical.is_empty() {
            if !self.manifest.contains_key(&digest) {
                return Err(InventoryError::MissingContent(digest));
            }
        } else {
            check_path(physical).map_err(|violation| InventoryError::InvalidPath {
                path: physical.to_string(),
                violation,
            })?;
            let paths = self.manifest.entry(digest.clone()).or_default();
            if !paths.iter().any(|p| p == physical) {
                paths.push(physical.to_string());
            }
        }

        let head = self.head;
        let version = self
            .versions
            .get_mut(&head)
            .ok_or_else(|| InventoryError::Empty(self.id.clone()))?;
        if let Some(old) = &current {
            remove_from(&mut version.state, old, logical);
        }
        version
            .state
            .entry(digest.clone())
            .or_default()
            .push(logical.to_string());

        debug!(logical, physical, %digest, update = current.is_some(), "added file");
        self.head_index.insert(logical.to_string(), digest);
        self.modified = true;
        Ok(())
    }

    /// Remove `logical` from the head version. Returns `true` if it was
    /// present.
    pub fn delete_file(&mut self, logical: &str) -> InventoryResult<bool> {
        self.require_writable()?;
        let Some(digest) = self.head_index.remove(logical) else {
            return Ok(false);
        };
        if let Some(version) = self.versions.get_mut(&self.head) {
            remove_from(&mut version.state, &digest, logical);
        }
        debug!(logical, "deleted file");
        self.modified = true;
        Ok(true)
    }

    /// Rename `from` to `to` in the head version. Content is untouched.
    pub fn rename_file(&mut self, from: &str, to: &str) -> InventoryResult<()> {
        self.require_writable()?;
        check_path(to).map_err(|violation| InventoryError::InvalidPath {
            path: to.to_string(),
            violation,
        })?;
        let digest = self
            .head_index
            .get(from)
            .cloned()
            .ok_or_else(|| InventoryError::PathNotFound(from.to_string()))?;
        if self.head_index.contains_key(to) {
            return Err(InventoryError::PathExists(to.to_string()));
        }
        self.head_index.remove(from);
        if let Err(e) = self.check_logical_conflicts(to) {
            self.head_index.insert(from.to_string(), digest);
            return Err(e);
        }

        if let Some(paths) = self
            .versions
            .get_mut(&self.head)
            .and_then(|v| v.state.get_mut(&digest))
        {
            for p in paths.iter_mut().filter(|p| p.as_str() == from) {
                *p = to.to_string();
            }
        }
        debug!(from, to, "renamed file");
        self.head_index.insert(to.to_string(), digest);
        self.modified = true;
        Ok(())
    }

    /// Record a fixity digest for a content path.
    pub fn add_fixity(
        &mut self,
        physical: &str,
        algorithm: DigestAlgorithm,
        digest: &str,
    ) -> InventoryResult<()> {
        self.require_writable()?;
        let paths = self
            .fixity
            .get_or_insert_with(BTreeMap::new)
            .entry(algorithm.name().to_string())
            .or_default()
            .entry(digest.to_lowercase())
            .or_default();
        if !paths.iter().any(|p| p == physical) {
            paths.push(physical.to_string());
        }
        Ok(())
    }

    /// Drop manifest and fixity entries whose digest no version uses any
    /// more. Only content of the open version can become unused; its paths
    /// are returned so the caller can delete the files.
    pub fn prune_unreferenced(&mut self) -> InventoryResult<Vec<String>> {
        self.require_writable()?;
        let used: HashSet<&str> = self
            .versions
            .values()
            .flat_map(|v| v.state.keys().map(String::as_str))
            .collect();
        let unused: Vec<String> = self
            .manifest
            .keys()
            .filter(|d| !used.contains(d.as_str()))
            .cloned()
            .collect();

        let mut removed = Vec::new();
        for digest in unused {
            if let Some(paths) = self.manifest.remove(&digest) {
                removed.extend(paths);
            }
        }
        if let Some(fixity) = &mut self.fixity {
            for block in fixity.values_mut() {
                for paths in block.values_mut() {
                    paths.retain(|p| !removed.contains(p));
                }
                block.retain(|_, paths| !paths.is_empty());
            }
            fixity.retain(|_, block| !block.is_empty());
        }
        if self.fixity.as_ref().is_some_and(BTreeMap::is_empty) {
            self.fixity = None;
        }
        if !removed.is_empty() {
            debug!(id = %self.id, count = removed.len(), "pruned unused content");
        }
        Ok(removed)
    }

    // ---------------------------------------------------------------
    // Internal
    // ---------------------------------------------------------------

    fn require_writable(&self) -> InventoryResult<()> {
        if self.writable {
            Ok(())
        } else {
            Err(InventoryError::NotWritable(self.id.clone()))
        }
    }

    /// Rebuild the head logical path index from the head state.
    pub(crate) fn rebuild_index(&mut self) {
        self.head_index = self
            .versions
            .get(&self.head)
            .map(|v| {
                v.files()
                    .into_iter()
                    .map(|(p, d)| (p.to_string(), d.to_string()))
                    .collect()
            })
            .unwrap_or_default();
    }

    fn check_logical_conflicts(&self, logical: &str) -> InventoryResult<()> {
        if let Some(prefix) = path::ancestors(logical).find(|a| self.head_index.contains_key(*a)) {
            return Err(InventoryError::PathConflict {
                path: logical.to_string(),
                other: prefix.to_string(),
            });
        }
        let as_dir = format!("{logical}/");
        if let Some(child) = self.head_index.keys().find(|k| k.starts_with(&as_dir)) {
            return Err(InventoryError::PathConflict {
                path: logical.to_string(),
                other: child.clone(),
            });
        }
        Ok(())
    }
}

fn remove_from(state: &mut DigestMap, digest: &str, logical: &str) {
    if let Some(paths) = state.get_mut(digest) {
        paths.retain(|p| p != logical);
        if paths.is_empty() {
            state.remove(digest);
        }
    }
}

/// A content directory name must be a single, non-dot path element.
pub fn valid_content_directory(dir: &str) -> bool {
    !dir.is_empty() && dir != "." && dir != ".." && !dir.contains('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocfl_crypto::digest_bytes;

    fn sha512(data: &str) -> String {
        digest_bytes(DigestAlgorithm::Sha512, data.as_bytes())
    }

    fn new_inventory() -> Inventory {
        Inventory::new("obj1", SpecVersion::V1_1, DigestAlgorithm::Sha512, None).unwrap()
    }

    fn committed_with_a() -> Inventory {
        let mut inv = new_inventory();
        inv.new_version("init", "Jane", "jane@example.org").unwrap();
        let realname = inv.build_realname("a.txt");
        inv.add_file("a.txt", &realname, &sha512("hello")).unwrap();
        inv.clean().unwrap();
        inv.finish_version();
        inv
    }

    #[test]
    fn new_object_single_file() {
        let inv = committed_with_a();
        let d = sha512("hello");
        assert_eq!(inv.head().to_string(), "v1");
        assert_eq!(inv.manifest()[&d], vec!["v1/content/a.txt"]);
        assert_eq!(inv.head_version().unwrap().state[&d], vec!["a.txt"]);
        let user = inv.head_version().unwrap().user.as_ref().unwrap();
        assert_eq!(user.name, "Jane");
        assert_eq!(user.address.as_deref(), Some("jane@example.org"));
    }

    #[test]
    fn duplicate_add_is_cleaned_away() {
        let mut inv = committed_with_a();
        let v2 = inv.new_version("again", "Jane", "").unwrap();
        assert_eq!(v2.to_string(), "v2");
        let realname = inv.build_realname("a.txt");
        inv.add_file("a.txt", &realname, &sha512("hello")).unwrap();
        assert!(!inv.is_modified());
        assert!(inv.clean().unwrap());
        inv.finish_version();
        assert_eq!(inv.head().to_string(), "v1");
        assert_eq!(inv.versions().len(), 1);
        assert_eq!(inv.manifest()[&sha512("hello")].len(), 1);
    }

    #[test]
    fn add_is_idempotent() {
        let mut inv = new_inventory();
        inv.new_version("init", "", "").unwrap();
        let d = sha512("x");
        inv.add_file("x", "v1/content/x", &d).unwrap();
        let manifest = inv.manifest().clone();
        let state = inv.head_version().unwrap().state.clone();
        inv.add_file("x", "v1/content/x", &d).unwrap();
        assert_eq!(inv.manifest(), &manifest);
        assert_eq!(inv.head_version().unwrap().state, state);
    }

    #[test]
    fn rename_keeps_manifest() {
        let mut inv = committed_with_a();
        let manifest = inv.manifest().clone();
        inv.new_version("rename", "", "").unwrap();
        inv.rename_file("a.txt", "b.txt").unwrap();
        inv.clean().unwrap();
        inv.finish_version();

        let d = sha512("hello");
        assert_eq!(inv.head().to_string(), "v2");
        assert_eq!(inv.head_version().unwrap().state[&d], vec!["b.txt"]);
        assert_eq!(inv.manifest(), &manifest);
        assert_eq!(inv.version(VersionNumber::first()).unwrap().state[&d], vec!["a.txt"]);
    }

    #[test]
    fn update_replaces_mapping() {
        let mut inv = committed_with_a();
        inv.new_version("update", "", "").unwrap();
        assert!(inv.is_update("a.txt", &sha512("changed")));
        let realname = inv.build_realname("a.txt");
        inv.add_file("a.txt", &realname, &sha512("changed")).unwrap();

        let head = inv.head_version().unwrap();
        assert_eq!(head.state.len(), 1);
        assert_eq!(head.state[&sha512("changed")], vec!["a.txt"]);
        assert_eq!(inv.manifest()[&sha512("hello")], vec!["v1/content/a.txt"]);
        assert_eq!(inv.manifest()[&sha512("changed")], vec!["v2/content/a.txt"]);
    }

    #[test]
    fn same_content_new_path_is_reference_only() {
        let mut inv = committed_with_a();
        inv.new_version("copy", "", "").unwrap();
        let d = sha512("hello");
        assert!(inv.is_duplicate(&d));
        assert!(!inv.already_exists("copy.txt"));
        inv.add_file("copy.txt", "", &d).unwrap();
        let head = inv.head_version().unwrap();
        assert_eq!(head.state[&d], vec!["a.txt", "copy.txt"]);
        assert_eq!(inv.manifest()[&d].len(), 1);
    }

    #[test]
    fn reference_only_add_requires_content() {
        let mut inv = new_inventory();
        inv.new_version("init", "", "").unwrap();
        assert!(matches!(
            inv.add_file("a", "", &sha512("nope")),
            Err(InventoryError::MissingContent(_))
        ));
    }

    #[test]
    fn delete_marks_modified_only_on_removal() {
        let mut inv = committed_with_a();
        inv.new_version("delete", "", "").unwrap();
        assert!(!inv.delete_file("missing").unwrap());
        assert!(!inv.is_modified());
        assert!(inv.delete_file("a.txt").unwrap());
        assert!(inv.is_modified());
        assert!(inv.head_version().unwrap().state.is_empty());
    }

    #[test]
    fn readded_after_delete_is_not_duplicate() {
        let mut inv = committed_with_a();
        inv.new_version("delete", "", "").unwrap();
        inv.delete_file("a.txt").unwrap();
        inv.finish_version();

        inv.new_version("restore", "", "").unwrap();
        inv.add_file("a.txt", "", &sha512("hello")).unwrap();
        assert!(inv.is_modified());
        assert_eq!(inv.files(None).get("a.txt"), Some(&sha512("hello")));
    }

    #[test]
    fn mutations_require_open_version() {
        let mut inv = committed_with_a();
        assert!(matches!(
            inv.add_file("b", "v1/content/b", &sha512("b")),
            Err(InventoryError::NotWritable(_))
        ));
        assert!(inv.delete_file("a.txt").is_err());
        assert!(inv.rename_file("a.txt", "c").is_err());
    }

    #[test]
    fn new_version_twice_fails() {
        let mut inv = new_inventory();
        inv.new_version("one", "", "").unwrap();
        assert!(matches!(
            inv.new_version("two", "", ""),
            Err(InventoryError::AlreadyWritable(_))
        ));
    }

    #[test]
    fn rename_errors() {
        let mut inv = committed_with_a();
        inv.new_version("r", "", "").unwrap();
        inv.add_file("b.txt", "", &sha512("hello")).unwrap();
        assert!(matches!(
            inv.rename_file("nope", "x"),
            Err(InventoryError::PathNotFound(_))
        ));
        assert!(matches!(
            inv.rename_file("a.txt", "b.txt"),
            Err(InventoryError::PathExists(_))
        ));
    }

    #[test]
    fn logical_path_conflicts_rejected() {
        let mut inv = committed_with_a();
        inv.new_version("c", "", "").unwrap();
        let err = inv.add_file("a.txt/inner", "", &sha512("hello")).unwrap_err();
        assert!(matches!(err, InventoryError::PathConflict { .. }));
        inv.add_file("dir/x", "", &sha512("hello")).unwrap();
        let err = inv.add_file("dir", "", &sha512("hello")).unwrap_err();
        assert!(matches!(err, InventoryError::PathConflict { .. }));
    }

    #[test]
    fn last_seen_uses_numeric_order() {
        let mut inv = new_inventory();
        for i in 1..=10 {
            inv.new_version("", "", "").unwrap();
            let content = format!("rev {i}");
            let realname = inv.build_realname("f");
            inv.add_file("f", &realname, &sha512(&content)).unwrap();
            inv.finish_version();
        }
        let (v, d) = inv.last_seen("f").unwrap();
        assert_eq!(v.number(), 10);
        assert_eq!(d, sha512("rev 10"));
    }

    #[test]
    fn prune_drops_content_added_then_deleted() {
        let mut inv = committed_with_a();
        inv.new_version("scratch", "", "").unwrap();
        let realname = inv.build_realname("tmp.txt");
        inv.add_file("tmp.txt", &realname, &sha512("scratch")).unwrap();
        inv.add_fixity(&realname, DigestAlgorithm::Md5, "00ff").unwrap();
        inv.delete_file("tmp.txt").unwrap();

        let removed = inv.prune_unreferenced().unwrap();
        assert_eq!(removed, vec!["v2/content/tmp.txt".to_string()]);
        assert!(!inv.is_duplicate(&sha512("scratch")));
        assert!(inv.is_duplicate(&sha512("hello")));
        assert!(inv.fixity().is_none());
    }

    #[test]
    fn content_directory_rules() {
        let inv = Inventory::new("o", SpecVersion::V1_1, DigestAlgorithm::Sha512, Some("data")).unwrap();
        assert_eq!(inv.content_directory(), "data");
        let inv = Inventory::new("o", SpecVersion::V1_1, DigestAlgorithm::Sha512, Some("content")).unwrap();
        assert!(inv.content_directory.is_none());
        assert!(Inventory::new("o", SpecVersion::V1_1, DigestAlgorithm::Sha512, Some("a/b")).is_err());
        assert!(Inventory::new("o", SpecVersion::V1_1, DigestAlgorithm::Md5, None).is_err());
    }

    #[test]
    fn fixity_is_recorded_once() {
        let mut inv = new_inventory();
        inv.new_version("f", "", "").unwrap();
        inv.add_fixity("v1/content/a", DigestAlgorithm::Md5, "ABC").unwrap();
        inv.add_fixity("v1/content/a", DigestAlgorithm::Md5, "abc").unwrap();
        let fixity = inv.fixity().unwrap();
        assert_eq!(fixity["md5"]["abc"], vec!["v1/content/a"]);
    }

    proptest::proptest! {
        #[test]
        fn repeated_add_changes_nothing(
            files in proptest::collection::btree_map("[a-z]{1,8}", "[a-z]{0,16}", 1..8)
        ) {
            let mut inv = new_inventory();
            inv.new_version("p", "", "").unwrap();
            for (name, content) in &files {
                let realname = inv.build_realname(name);
                inv.add_file(name, &realname, &sha512(content)).unwrap();
            }
            let manifest = inv.manifest().clone();
            let state = inv.head_version().unwrap().state.clone();
            for (name, content) in &files {
                let realname = inv.build_realname(name);
                inv.add_file(name, &realname, &sha512(content)).unwrap();
            }
            proptest::prop_assert_eq!(inv.manifest(), &manifest);
            proptest::prop_assert_eq!(&inv.head_version().unwrap().state, &state);
        }
    }
}
