use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Revision of the OCFL specification an object or storage root conforms to.
///
/// Ordering follows publication order, so `V1_0 < V1_1 < V2_0`. Objects may
/// never regress to an earlier revision across their version history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum SpecVersion {
    V1_0,
    #[default]
    V1_1,
    V2_0,
}

impl SpecVersion {
    /// All supported revisions, oldest first.
    pub const ALL: [SpecVersion; 3] = [Self::V1_0, Self::V1_1, Self::V2_0];

    /// The newest revision this crate knows.
    pub const fn latest() -> Self {
        Self::V2_0
    }

    /// The version tag (`"1.0"`, `"1.1"`, `"2.0"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1_0 => "1.0",
            Self::V1_1 => "1.1",
            Self::V2_0 => "2.0",
        }
    }

    /// The inventory `type` URI for this revision.
    pub fn inventory_type(&self) -> String {
        format!("https://ocfl.io/{}/spec/#inventory", self.as_str())
    }

    /// Parse the revision out of an inventory `type` URI.
    pub fn from_inventory_type(uri: &str) -> Result<Self, TypeError> {
        let tag = uri
            .strip_prefix("https://ocfl.io/")
            .and_then(|rest| rest.strip_suffix("/spec/#inventory"))
            .ok_or_else(|| TypeError::UnknownSpecVersion(uri.to_string()))?;
        tag.parse()
    }

    /// NAMASTE `dvalue` of an object conformance declaration (`ocfl_object_1.1`).
    pub fn object_declaration(&self) -> String {
        format!("ocfl_object_{}", self.as_str())
    }

    /// NAMASTE `dvalue` of a storage root conformance declaration (`ocfl_1.1`).
    pub fn root_declaration(&self) -> String {
        format!("ocfl_{}", self.as_str())
    }

    /// Base URL of the specification text, used for validation references.
    pub fn spec_url(&self) -> String {
        format!("https://ocfl.io/{}/spec/", self.as_str())
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpecVersion {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1.0" => Ok(Self::V1_0),
            "1.1" => Ok(Self::V1_1),
            "2.0" => Ok(Self::V2_0),
            other => Err(TypeError::UnknownSpecVersion(other.to_string())),
        }
    }
}

impl Serialize for SpecVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SpecVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_follows_publication() {
        assert!(SpecVersion::V1_0 < SpecVersion::V1_1);
        assert!(SpecVersion::V1_1 < SpecVersion::V2_0);
    }

    #[test]
    fn inventory_type_roundtrip() {
        for v in SpecVersion::ALL {
            let uri = v.inventory_type();
            assert_eq!(SpecVersion::from_inventory_type(&uri).unwrap(), v);
        }
    }

    #[test]
    fn inventory_type_rejects_foreign_uri() {
        assert!(SpecVersion::from_inventory_type("https://example.org/inventory").is_err());
        assert!(SpecVersion::from_inventory_type("https://ocfl.io/9.9/spec/#inventory").is_err());
    }

    #[test]
    fn declarations() {
        assert_eq!(SpecVersion::V1_1.object_declaration(), "ocfl_object_1.1");
        assert_eq!(SpecVersion::V1_0.root_declaration(), "ocfl_1.0");
    }

    #[test]
    fn serde_as_string() {
        let json = serde_json::to_string(&SpecVersion::V2_0).unwrap();
        assert_eq!(json, "\"2.0\"");
        let parsed: SpecVersion = serde_json::from_str("\"1.0\"").unwrap();
        assert_eq!(parsed, SpecVersion::V1_0);
    }
}
