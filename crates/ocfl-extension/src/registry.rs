use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use crate::error::{ExtensionError, ExtensionResult};
use crate::extension::{extension_name, Extension};
use crate::manager::MANAGER_NAME;
use crate::strategies::*;

/// Builds an extension from its configuration.
pub type Constructor = fn(Value) -> ExtensionResult<Arc<dyn Extension>>;

/// Maps extension names to constructors.
///
/// Read-only once populated; share it behind an `Arc` between storage
/// roots and objects.
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    constructors: HashMap<String, Constructor>,
}

macro_rules! builtin {
    ($ty:ty) => {
        |config| Ok(Arc::new(<$ty>::from_config(config)?) as Arc<dyn Extension>)
    };
}

impl ExtensionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in extension.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(DIRECT_NAME, builtin!(Direct));
        registry.register(DIRECT_CLEAN_NAME, builtin!(DirectClean));
        registry.register(FLAT_DIRECT_NAME, builtin!(FlatDirect));
        registry.register(HASH_AND_ID_NAME, builtin!(HashAndIdNTuple));
        registry.register(HASHED_N_TUPLE_NAME, builtin!(HashedNTuple));
        registry.register(FLAT_OMIT_PREFIX_NAME, builtin!(FlatOmitPrefix));
        registry.register(PAIRTREE_NAME, builtin!(PairTree));
        registry.register(SHARDED_PAIRTREE_NAME, builtin!(ShardedPairTree));
        registry.register(FIXITY_DIGESTS_NAME, builtin!(FixityDigests));
        registry.register(CONTENT_FILTER_NAME, builtin!(ContentFilter));
        registry.register(CONTENT_SUMMARY_NAME, builtin!(ContentSummary));
        registry
    }

    /// Register (or replace) a constructor.
    pub fn register(&mut self, name: impl Into<String>, constructor: Constructor) {
        self.constructors.insert(name.into(), constructor);
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns `true` if an extension of this name can be built.
    pub fn is_supported(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Like [`Self::is_supported`], but also accepts directory names the
    /// library writes itself.
    pub fn is_known(&self, name: &str) -> bool {
        name == MANAGER_NAME || self.is_supported(name)
    }

    /// Build an extension from a configuration blob.
    pub fn create(&self, config: Value) -> ExtensionResult<Arc<dyn Extension>> {
        let name = extension_name(&config)?.to_string();
        let constructor = self
            .constructors
            .get(&name)
            .ok_or_else(|| ExtensionError::NotSupported(name.clone()))?;
        debug!(extension = %name, "creating extension");
        constructor(config)
    }

    /// Build an extension with its default configuration.
    pub fn create_default(&self, name: &str) -> ExtensionResult<Arc<dyn Extension>> {
        self.create(json!({ "extensionName": name }))
    }
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::Capability;

    #[test]
    fn builtins_are_registered() {
        let registry = ExtensionRegistry::with_builtins();
        assert_eq!(registry.names().len(), 11);
        assert!(registry.is_supported(HASHED_N_TUPLE_NAME));
        assert!(!registry.is_supported(MANAGER_NAME));
        assert!(registry.is_known(MANAGER_NAME));
    }

    #[test]
    fn creates_from_config() {
        let registry = ExtensionRegistry::with_builtins();
        let ext = registry
            .create(json!({ "extensionName": PAIRTREE_NAME, "shortyLength": 3 }))
            .unwrap();
        assert_eq!(ext.name(), PAIRTREE_NAME);
        assert_eq!(ext.config()["shortyLength"], 3);
        assert_eq!(ext.capabilities(), vec![Capability::StorageRootPath]);
    }

    #[test]
    fn unknown_name_is_not_supported() {
        let registry = ExtensionRegistry::with_builtins();
        let err = registry.create_default("9999-made-up").unwrap_err();
        assert!(matches!(err, ExtensionError::NotSupported(ref n) if n == "9999-made-up"));
    }

    #[test]
    fn missing_name() {
        let registry = ExtensionRegistry::with_builtins();
        assert!(matches!(
            registry.create(json!({ "tupleSize": 3 })),
            Err(ExtensionError::MissingName)
        ));
    }

    #[test]
    fn bad_config_is_reported() {
        let registry = ExtensionRegistry::with_builtins();
        let err = registry
            .create(json!({ "extensionName": HASHED_N_TUPLE_NAME, "tupleSize": "three" }))
            .unwrap_err();
        assert!(matches!(err, ExtensionError::InvalidConfig { .. }));
    }

    #[test]
    fn custom_registration() {
        let mut registry = ExtensionRegistry::new();
        registry.register("local-direct", builtin!(Direct));
        assert!(registry.create_default("local-direct").is_ok());
        assert!(registry.create_default(DIRECT_NAME).is_err());
    }
}
