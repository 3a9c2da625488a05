use std::collections::BTreeMap;
use std::fmt;

use ocfl_types::DigestAlgorithm;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ExtensionError, ExtensionResult};

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// The behaviours an extension can offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    StorageRootPath,
    ObjectContentPath,
    ContentChange,
    FixityDigest,
    Metadata,
}

/// Maps an object identifier to its directory below the storage root.
pub trait StorageRootPath {
    fn build_storage_root_path(&self, id: &str) -> ExtensionResult<String>;
}

/// Maps a logical path to the path stored under the content directory.
pub trait ObjectContentPath {
    fn build_object_content_path(&self, logical: &str) -> ExtensionResult<String>;
}

/// Hooks around changes to an object's head version.
///
/// `before_*` hooks may refuse the change by returning an error.
pub trait ContentChange {
    fn before_add(&self, _logical: &str) -> ExtensionResult<()> {
        Ok(())
    }
    fn after_add(&self, _logical: &str, _digest: &str) -> ExtensionResult<()> {
        Ok(())
    }
    fn before_update(&self, _logical: &str) -> ExtensionResult<()> {
        Ok(())
    }
    fn after_update(&self, _logical: &str, _digest: &str) -> ExtensionResult<()> {
        Ok(())
    }
    fn before_delete(&self, _logical: &str) -> ExtensionResult<()> {
        Ok(())
    }
    fn after_delete(&self, _logical: &str) -> ExtensionResult<()> {
        Ok(())
    }
}

/// Declares digests to compute, in addition to the primary one, for every
/// ingested file.
pub trait FixityDigest {
    fn fixity_algorithms(&self) -> Vec<DigestAlgorithm>;
}

/// What a [`Metadata`] extension may look at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectState {
    pub id: String,
    pub head: String,
    pub digest_algorithm: DigestAlgorithm,
    pub versions: usize,
    /// Logical path to digest in the head version.
    pub files: BTreeMap<String, String>,
}

/// Derives object-level metadata.
pub trait Metadata {
    fn object_metadata(&self, state: &ObjectState) -> ExtensionResult<Value>;
}

// ---------------------------------------------------------------------------
// Extension
// ---------------------------------------------------------------------------

/// A named, configured strategy.
///
/// Extensions are stateless with respect to the objects they are applied
/// to. Each capability is exposed through an `as_*` view that returns
/// `None` when the extension does not offer it.
pub trait Extension: Send + Sync + fmt::Debug {
    /// Registered extension name.
    fn name(&self) -> &str;

    /// The configuration as stored in `config.json`.
    fn config(&self) -> Value;

    fn as_storage_root_path(&self) -> Option<&dyn StorageRootPath> {
        None
    }

    fn as_object_content_path(&self) -> Option<&dyn ObjectContentPath> {
        None
    }

    fn as_content_change(&self) -> Option<&dyn ContentChange> {
        None
    }

    fn as_fixity_digest(&self) -> Option<&dyn FixityDigest> {
        None
    }

    fn as_metadata(&self) -> Option<&dyn Metadata> {
        None
    }

    /// Every capability this extension offers.
    fn capabilities(&self) -> Vec<Capability> {
        let mut caps = Vec::new();
        if self.as_storage_root_path().is_some() {
            caps.push(Capability::StorageRootPath);
        }
        if self.as_object_content_path().is_some() {
            caps.push(Capability::ObjectContentPath);
        }
        if self.as_content_change().is_some() {
            caps.push(Capability::ContentChange);
        }
        if self.as_fixity_digest().is_some() {
            caps.push(Capability::FixityDigest);
        }
        if self.as_metadata().is_some() {
            caps.push(Capability::Metadata);
        }
        caps
    }

    fn has(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

/// The `extensionName` of a configuration blob.
pub fn extension_name(config: &Value) -> ExtensionResult<&str> {
    config
        .get("extensionName")
        .and_then(Value::as_str)
        .ok_or(ExtensionError::MissingName)
}

/// Deserialize a typed configuration, attributing failures to `name`.
pub(crate) fn parse_config<T: DeserializeOwned>(name: &str, config: Value) -> ExtensionResult<T> {
    serde_json::from_value(config).map_err(|e| ExtensionError::config(name, e.to_string()))
}

/// Parse a digest algorithm named in a configuration.
pub(crate) fn parse_algorithm(name: &str, value: &str) -> ExtensionResult<DigestAlgorithm> {
    value
        .parse()
        .map_err(|_| ExtensionError::config(name, format!("unknown digestAlgorithm {value:?}")))
}
