//! Serialized shape of an OCFL inventory.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, FixedOffset, SubsecRound, Utc};
use ocfl_types::{DigestAlgorithm, VersionNumber};
use serde::{Deserialize, Serialize};

/// Digest to paths. Used for the manifest, each version state, and each
/// fixity algorithm block.
pub type DigestMap = BTreeMap<String, Vec<String>>;

/// Who made a version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct User {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// One entry of the `versions` block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Version {
    pub created: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Digest to logical paths.
    pub state: DigestMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl Version {
    /// A new version created now, with an empty state.
    pub fn new(message: Option<String>, user: Option<User>) -> Self {
        Self {
            created: Utc::now().trunc_subsecs(0).fixed_offset(),
            message,
            state: DigestMap::new(),
            user,
        }
    }

    /// Logical path to digest for this version.
    pub fn files(&self) -> BTreeMap<&str, &str> {
        self.state
            .iter()
            .flat_map(|(digest, paths)| paths.iter().map(move |p| (p.as_str(), digest.as_str())))
            .collect()
    }

    /// Digest recorded for `logical`, if present.
    pub fn digest_of(&self, logical: &str) -> Option<&str> {
        self.state
            .iter()
            .find(|(_, paths)| paths.iter().any(|p| p == logical))
            .map(|(d, _)| d.as_str())
    }
}

/// An OCFL object inventory.
///
/// Field order here is the key order of the serialized JSON. The fields
/// marked `skip` hold in-memory editing state only.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Inventory {
    pub(crate) id: String,
    #[serde(rename = "type")]
    pub(crate) type_uri: String,
    pub(crate) digest_algorithm: DigestAlgorithm,
    pub(crate) head: VersionNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) content_directory: Option<String>,
    pub(crate) manifest: DigestMap,
    pub(crate) versions: BTreeMap<VersionNumber, Version>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) fixity: Option<BTreeMap<String, DigestMap>>,

    /// A version has been opened and not yet committed.
    #[serde(skip)]
    pub(crate) writable: bool,
    /// The open version differs from its predecessor.
    #[serde(skip)]
    pub(crate) modified: bool,
    /// Logical path to digest for the head version.
    #[serde(skip)]
    pub(crate) head_index: HashMap<String, String>,
}
