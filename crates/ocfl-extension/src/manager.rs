use std::collections::BTreeMap;
use std::sync::Arc;

use ocfl_store::{FileSystem, FsError};
use ocfl_types::{DigestAlgorithm, ErrorList};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ExtensionError, ExtensionResult};
use crate::extension::{Capability, ContentChange, Extension, ObjectState};
use crate::registry::ExtensionRegistry;

/// Directory holding one sub-directory per active extension.
pub const EXTENSIONS_DIR: &str = "extensions";
/// Configuration file inside an extension directory.
pub const CONFIG_FILE: &str = "config.json";
/// Pseudo-extension persisting the activation order.
pub const MANAGER_NAME: &str = "NNNN-extension-manager";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManagerConfig {
    extension_name: String,
    #[serde(default)]
    order: Vec<String>,
}

/// `extensions/<name>/config.json`
pub fn config_path(name: &str) -> String {
    format!("{EXTENSIONS_DIR}/{name}/{CONFIG_FILE}")
}

// ---------------------------------------------------------------------------
// ExtensionManager
// ---------------------------------------------------------------------------

/// The ordered set of extensions active on an object or storage root.
///
/// Every capability is resolved by asking the extensions in activation
/// order. Path resolution stops at the first extension producing a
/// non-empty path; errors from the extensions asked before it are returned
/// alongside. Hooks run on every extension and their errors are combined.
#[derive(Clone, Debug, Default)]
pub struct ExtensionManager {
    extensions: Vec<Arc<dyn Extension>>,
}

impl ExtensionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate an extension after the ones already active.
    pub fn add(&mut self, extension: Arc<dyn Extension>) -> ExtensionResult<()> {
        if self.get(extension.name()).is_some() {
            return Err(ExtensionError::AlreadyActive(extension.name().to_string()));
        }
        debug!(extension = extension.name(), "activating extension");
        self.extensions.push(extension);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Extension>> {
        self.extensions.iter().find(|e| e.name() == name)
    }

    pub fn extensions(&self) -> &[Arc<dyn Extension>] {
        &self.extensions
    }

    pub fn names(&self) -> Vec<&str> {
        self.extensions.iter().map(|e| e.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Active extensions offering `capability`, in order.
    pub fn with_capability(&self, capability: Capability) -> impl Iterator<Item = &Arc<dyn Extension>> {
        self.extensions.iter().filter(move |e| e.has(capability))
    }

    // -- path resolution ----------------------------------------------------

    /// First non-empty storage root path, plus the errors met on the way.
    pub fn build_storage_root_path(&self, id: &str) -> (Option<String>, ErrorList) {
        first_path(
            self.extensions
                .iter()
                .filter_map(|e| e.as_storage_root_path())
                .map(|s| s.build_storage_root_path(id)),
        )
    }

    /// First non-empty content path, plus the errors met on the way.
    pub fn build_object_content_path(&self, logical: &str) -> (Option<String>, ErrorList) {
        first_path(
            self.extensions
                .iter()
                .filter_map(|e| e.as_object_content_path())
                .map(|s| s.build_object_content_path(logical)),
        )
    }

    /// Resolve a storage root path, falling back to the identifier itself
    /// when no active extension maps identifiers.
    pub fn storage_root_path(&self, id: &str) -> ExtensionResult<String> {
        settle(self.build_storage_root_path(id), id)
    }

    /// Resolve a content path, falling back to the logical path itself when
    /// no active extension maps logical paths.
    pub fn object_content_path(&self, logical: &str) -> ExtensionResult<String> {
        settle(self.build_object_content_path(logical), logical)
    }

    // -- fixity -------------------------------------------------------------

    /// Union of the algorithms requested by every fixity extension.
    pub fn fixity_algorithms(&self) -> Vec<DigestAlgorithm> {
        let mut algorithms: Vec<DigestAlgorithm> = self
            .extensions
            .iter()
            .filter_map(|e| e.as_fixity_digest())
            .flat_map(|f| f.fixity_algorithms())
            .collect();
        algorithms.sort();
        algorithms.dedup();
        algorithms
    }

    // -- content hooks ------------------------------------------------------

    pub fn before_add(&self, logical: &str) -> ExtensionResult<()> {
        self.each_hook(|h| h.before_add(logical))
    }

    pub fn after_add(&self, logical: &str, digest: &str) -> ExtensionResult<()> {
        self.each_hook(|h| h.after_add(logical, digest))
    }

    pub fn before_update(&self, logical: &str) -> ExtensionResult<()> {
        self.each_hook(|h| h.before_update(logical))
    }

    pub fn after_update(&self, logical: &str, digest: &str) -> ExtensionResult<()> {
        self.each_hook(|h| h.after_update(logical, digest))
    }

    pub fn before_delete(&self, logical: &str) -> ExtensionResult<()> {
        self.each_hook(|h| h.before_delete(logical))
    }

    pub fn after_delete(&self, logical: &str) -> ExtensionResult<()> {
        self.each_hook(|h| h.after_delete(logical))
    }

    fn each_hook(&self, hook: impl Fn(&dyn ContentChange) -> ExtensionResult<()>) -> ExtensionResult<()> {
        let mut errors = ErrorList::new();
        for change in self.extensions.iter().filter_map(|e| e.as_content_change()) {
            errors.collect(hook(change));
        }
        aggregate(errors)
    }

    // -- metadata -----------------------------------------------------------

    /// Metadata from every metadata extension, keyed by extension name.
    pub fn metadata(&self, state: &ObjectState) -> ExtensionResult<BTreeMap<String, Value>> {
        let mut out = BTreeMap::new();
        let mut errors = ErrorList::new();
        for ext in &self.extensions {
            if let Some(meta) = ext.as_metadata() {
                if let Some(value) = errors.collect(meta.object_metadata(state)) {
                    out.insert(ext.name().to_string(), value);
                }
            }
        }
        aggregate(errors)?;
        Ok(out)
    }

    // -- persistence --------------------------------------------------------

    /// Write `extensions/<name>/config.json` for every active extension.
    ///
    /// With more than one extension active the order is written too, as
    /// the configuration of [`MANAGER_NAME`].
    pub fn store(&self, fs: &dyn FileSystem) -> ExtensionResult<()> {
        for ext in &self.extensions {
            let bytes = serde_json::to_vec_pretty(&ext.config())?;
            fs.write_all(&config_path(ext.name()), &bytes)?;
        }
        if self.extensions.len() > 1 {
            let manager = ManagerConfig {
                extension_name: MANAGER_NAME.to_string(),
                order: self.names().into_iter().map(String::from).collect(),
            };
            fs.write_all(&config_path(MANAGER_NAME), &serde_json::to_vec_pretty(&manager)?)?;
        }
        debug!(location = %fs.location(), count = self.extensions.len(), "stored extensions");
        Ok(())
    }

    /// Rebuild the active extensions from an `extensions` directory.
    ///
    /// Directories whose names the registry does not support are skipped
    /// with a warning and returned as the second element. A directory
    /// without `config.json` is built with its default configuration.
    pub fn load(fs: &dyn FileSystem, registry: &ExtensionRegistry) -> ExtensionResult<(Self, Vec<String>)> {
        let entries = match fs.read_dir(EXTENSIONS_DIR) {
            Ok(entries) => entries,
            Err(e) if e.is_not_found() => return Ok((Self::new(), Vec::new())),
            Err(e) => return Err(e.into()),
        };

        let mut order = Vec::new();
        let mut loaded = Vec::new();
        let mut unknown = Vec::new();
        for entry in entries.into_iter().filter(|e| e.is_dir) {
            if entry.name == MANAGER_NAME {
                if let Some(bytes) = read_config(fs, &entry.name)? {
                    let manager: ManagerConfig = serde_json::from_slice(&bytes)?;
                    order = manager.order;
                }
                continue;
            }
            if !registry.is_supported(&entry.name) {
                warn!(location = %fs.location(), extension = %entry.name, "skipping unsupported extension");
                unknown.push(entry.name);
                continue;
            }
            let ext = match read_config(fs, &entry.name)? {
                Some(bytes) => registry.create(serde_json::from_slice(&bytes)?)?,
                None => registry.create_default(&entry.name)?,
            };
            if ext.name() != entry.name {
                return Err(ExtensionError::config(
                    &entry.name,
                    format!("config.json names {}", ext.name()),
                ));
            }
            loaded.push(ext);
        }

        // Listed extensions first, in persisted order; the rest by name.
        loaded.sort_by_key(|e| order.iter().position(|n| n == e.name()).unwrap_or(usize::MAX));

        let mut manager = Self::new();
        for ext in loaded {
            manager.add(ext)?;
        }
        Ok((manager, unknown))
    }
}

fn read_config(fs: &dyn FileSystem, name: &str) -> ExtensionResult<Option<Vec<u8>>> {
    match fs.read_all(&config_path(name)) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(FsError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn first_path(results: impl Iterator<Item = ExtensionResult<String>>) -> (Option<String>, ErrorList) {
    let mut errors = ErrorList::new();
    for result in results {
        match result {
            Ok(path) if !path.is_empty() => return (Some(path), errors),
            Ok(_) => {}
            Err(e) => errors.push(e),
        }
    }
    (None, errors)
}

/// Collapse a path lookup into one result. Failures of earlier extensions
/// are logged when a later one answers; callers needing them use the
/// `build_*` methods.
fn settle((path, errors): (Option<String>, ErrorList), fallback: &str) -> ExtensionResult<String> {
    match path {
        Some(path) => {
            for error in errors.iter() {
                warn!(input = fallback, %path, %error, "extension failed; a later one answered");
            }
            Ok(path)
        }
        None if errors.is_empty() => Ok(fallback.to_string()),
        None => Err(ExtensionError::Aggregate(errors)),
    }
}

fn aggregate(errors: ErrorList) -> ExtensionResult<()> {
    errors.into_result(()).map_err(ExtensionError::Aggregate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::*;
    use ocfl_store::MemoryFs;
    use serde_json::json;

    fn registry() -> ExtensionRegistry {
        ExtensionRegistry::with_builtins()
    }

    fn ext(config: Value) -> Arc<dyn Extension> {
        registry().create(config).unwrap()
    }

    #[test]
    fn duplicate_activation_fails() {
        let mut m = ExtensionManager::new();
        m.add(ext(json!({ "extensionName": DIRECT_NAME }))).unwrap();
        let err = m.add(ext(json!({ "extensionName": DIRECT_NAME }))).unwrap_err();
        assert!(matches!(err, ExtensionError::AlreadyActive(_)));
    }

    #[test]
    fn first_successful_path_wins() {
        let mut m = ExtensionManager::new();
        m.add(ext(json!({ "extensionName": FLAT_DIRECT_NAME }))).unwrap();
        m.add(ext(json!({ "extensionName": PAIRTREE_NAME }))).unwrap();

        let (path, errors) = m.build_storage_root_path("abcd");
        assert_eq!(path.as_deref(), Some("abcd"));
        assert!(errors.is_empty());

        // flat-direct refuses slashes, pairtree still answers
        let (path, errors) = m.build_storage_root_path("a/b");
        assert_eq!(path.as_deref(), Some("a=/b"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn earlier_failures_do_not_block_a_later_answer() {
        let mut m = ExtensionManager::new();
        m.add(ext(json!({ "extensionName": FLAT_DIRECT_NAME }))).unwrap();
        m.add(ext(json!({ "extensionName": PAIRTREE_NAME }))).unwrap();
        assert_eq!(m.storage_root_path("a/b").unwrap(), "a=/b");
        assert_eq!(m.build_storage_root_path("a/b").1.len(), 1);
    }

    #[test]
    fn every_failure_is_combined() {
        let mut m = ExtensionManager::new();
        m.add(ext(json!({ "extensionName": FLAT_DIRECT_NAME }))).unwrap();
        m.add(ext(json!({ "extensionName": DIRECT_NAME }))).unwrap();
        let (path, errors) = m.build_storage_root_path("");
        assert!(path.is_none());
        assert_eq!(errors.len(), 2);
        assert!(matches!(m.storage_root_path(""), Err(ExtensionError::Aggregate(_))));
    }

    #[test]
    fn identity_fallback() {
        let m = ExtensionManager::new();
        assert_eq!(m.object_content_path("a/b.txt").unwrap(), "a/b.txt");
        assert_eq!(m.storage_root_path("id").unwrap(), "id");
    }

    #[test]
    fn content_path_through_clean() {
        let mut m = ExtensionManager::new();
        m.add(ext(json!({ "extensionName": DIRECT_CLEAN_NAME }))).unwrap();
        assert_eq!(m.object_content_path("a:b/c?.txt").unwrap(), "a_b/c_.txt");
    }

    #[test]
    fn fixity_union() {
        let mut m = ExtensionManager::new();
        m.add(ext(json!({ "extensionName": FIXITY_DIGESTS_NAME, "algorithms": ["sha1", "md5"] })))
            .unwrap();
        assert_eq!(m.fixity_algorithms(), vec![DigestAlgorithm::Md5, DigestAlgorithm::Sha1]);
    }

    #[test]
    fn hooks_combine_errors() {
        let mut m = ExtensionManager::new();
        m.add(ext(json!({ "extensionName": CONTENT_FILTER_NAME, "exclude": ["\\.tmp$"] })))
            .unwrap();
        assert!(m.before_add("keep.txt").is_ok());
        assert!(matches!(m.before_add("x.tmp"), Err(ExtensionError::Aggregate(ref l)) if l.len() == 1));
        assert!(m.after_add("x.txt", "abc").is_ok());
    }

    #[test]
    fn metadata_by_name() {
        let mut m = ExtensionManager::new();
        m.add(ext(json!({ "extensionName": CONTENT_SUMMARY_NAME }))).unwrap();
        let meta = m.metadata(&ObjectState::default()).unwrap();
        assert_eq!(meta[CONTENT_SUMMARY_NAME]["files"], 0);
    }

    #[test]
    fn store_and_load_keep_order() {
        let fs = MemoryFs::new();
        let mut m = ExtensionManager::new();
        m.add(ext(json!({ "extensionName": PAIRTREE_NAME, "shortyLength": 4 }))).unwrap();
        m.add(ext(json!({ "extensionName": DIRECT_CLEAN_NAME }))).unwrap();
        m.add(ext(json!({ "extensionName": CONTENT_SUMMARY_NAME }))).unwrap();
        m.store(&fs).unwrap();
        assert!(fs.exists(&config_path(MANAGER_NAME)).unwrap());

        let (loaded, unknown) = ExtensionManager::load(&fs, &registry()).unwrap();
        assert!(unknown.is_empty());
        assert_eq!(loaded.names(), m.names());
        assert_eq!(loaded.get(PAIRTREE_NAME).unwrap().config()["shortyLength"], 4);
    }

    #[test]
    fn load_skips_unknown() {
        let fs = MemoryFs::new();
        fs.write_all(&config_path("9999-future"), b"{\"extensionName\":\"9999-future\"}")
            .unwrap();
        fs.create_dir(&format!("{EXTENSIONS_DIR}/{DIRECT_NAME}")).unwrap();
        let (loaded, unknown) = ExtensionManager::load(&fs, &registry()).unwrap();
        assert_eq!(unknown, vec!["9999-future".to_string()]);
        assert_eq!(loaded.names(), vec![DIRECT_NAME]);
    }

    #[test]
    fn load_without_directory() {
        let (loaded, unknown) = ExtensionManager::load(&MemoryFs::new(), &registry()).unwrap();
        assert!(loaded.is_empty());
        assert!(unknown.is_empty());
    }

    #[test]
    fn mismatched_config_name() {
        let fs = MemoryFs::new();
        fs.write_all(&config_path(DIRECT_NAME), b"{\"extensionName\":\"0002-flat-direct-storage-layout\"}")
            .unwrap();
        assert!(ExtensionManager::load(&fs, &registry()).is_err());
    }
}
