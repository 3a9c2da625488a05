use ocfl_extension::strategies::{DIRECT_CLEAN_NAME, HASHED_N_TUPLE_NAME};
use ocfl_types::{DigestAlgorithm, SpecVersion};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Settings applied when an object is created.
///
/// Loaded objects take their settings from their inventory and
/// `extensions` directory instead.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectConfig {
    /// Specification revision declared by new objects.
    pub spec_version: SpecVersion,
    /// Primary content-addressing algorithm (`sha512` or `sha256`).
    pub digest_algorithm: DigestAlgorithm,
    /// Extra digests recorded in the fixity block for every new file.
    pub fixity: Vec<DigestAlgorithm>,
    /// Content directory name; `None` means `content`.
    pub content_directory: Option<String>,
    /// Extension configurations activated on new objects, in order.
    pub extensions: Vec<Value>,
}

impl Default for ObjectConfig {
    fn default() -> Self {
        Self {
            spec_version: SpecVersion::V1_1,
            digest_algorithm: DigestAlgorithm::Sha512,
            fixity: Vec::new(),
            content_directory: None,
            extensions: vec![json!({ "extensionName": DIRECT_CLEAN_NAME })],
        }
    }
}

/// Settings applied when a storage root is initialised.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageRootConfig {
    /// Specification revision of the root declaration.
    pub spec_version: SpecVersion,
    /// Configuration of the extension mapping identifiers to object paths.
    pub layout: Value,
    /// Free text written to `ocfl_layout.json`.
    pub description: Option<String>,
}

impl Default for StorageRootConfig {
    fn default() -> Self {
        Self {
            spec_version: SpecVersion::V1_1,
            layout: json!({ "extensionName": HASHED_N_TUPLE_NAME }),
            description: None,
        }
    }
}
