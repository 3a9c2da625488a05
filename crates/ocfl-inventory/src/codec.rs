//! JSON encoding of inventories.
//!
//! Inventories are written with a three-space indent. The sidecar digest is
//! always computed over the exact bytes returned by [`Inventory::to_json`].

use ocfl_crypto::digest_bytes;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::error::InventoryResult;
use crate::model::Inventory;

impl Inventory {
    /// Serialize to the on-disk JSON form.
    pub fn to_json(&self) -> InventoryResult<Vec<u8>> {
        let mut out = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"   ");
        let mut ser = Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut ser)?;
        Ok(out)
    }

    /// Serialize and digest the result with the inventory's own algorithm.
    ///
    /// Returns `(bytes, lower-case hex digest)`.
    pub fn to_json_with_digest(&self) -> InventoryResult<(Vec<u8>, String)> {
        let bytes = self.to_json()?;
        let digest = digest_bytes(self.digest_algorithm, &bytes);
        Ok((bytes, digest))
    }

    /// Parse an inventory. The result is read-only.
    ///
    /// This is a strict parse: unknown keys and malformed values are errors.
    /// Use [`crate::check::parse_checked`] to collect conformance findings
    /// instead.
    pub fn from_json(bytes: &[u8]) -> InventoryResult<Self> {
        let mut inventory: Inventory = serde_json::from_slice(bytes)?;
        inventory.writable = false;
        inventory.modified = false;
        inventory.rebuild_index();
        Ok(inventory)
    }
}

#[cfg(test)]
mod tests {
    use ocfl_types::{DigestAlgorithm, SpecVersion, VersionNumber};

    use super::*;

    fn sample() -> Inventory {
        let mut inv =
            Inventory::new("ark:/12345/obj", SpecVersion::V1_1, DigestAlgorithm::Sha512, None).unwrap();
        inv.new_version("first", "Jane", "mailto:jane@example.org").unwrap();
        let d1 = digest_bytes(DigestAlgorithm::Sha512, b"one");
        inv.add_file("docs/one.txt", "v1/content/docs/one.txt", &d1).unwrap();
        inv.add_fixity("v1/content/docs/one.txt", DigestAlgorithm::Md5, "f97c5d29941bfb1b2fdab0874906ab82")
            .unwrap();
        inv.finish_version();
        inv.new_version("second", "", "").unwrap();
        let d2 = digest_bytes(DigestAlgorithm::Sha512, b"two");
        inv.add_file("two.txt", "v2/content/two.txt", &d2).unwrap();
        inv.finish_version();
        inv
    }

    #[test]
    fn json_round_trip() {
        let inv = sample();
        let bytes = inv.to_json().unwrap();
        let back = Inventory::from_json(&bytes).unwrap();

        assert_eq!(back.id(), inv.id());
        assert_eq!(back.digest_algorithm(), inv.digest_algorithm());
        assert_eq!(back.manifest(), inv.manifest());
        assert_eq!(back.versions(), inv.versions());
        assert_eq!(back.fixity(), inv.fixity());
        assert_eq!(back.head(), inv.head());
        assert!(!back.is_writable());
        assert_eq!(back.to_json().unwrap(), bytes);
    }

    #[test]
    fn uses_three_space_indent_and_ocfl_keys() {
        let text = String::from_utf8(sample().to_json().unwrap()).unwrap();
        assert!(text.starts_with("{\n   \"id\": \"ark:/12345/obj\""));
        assert!(text.contains("\"type\": \"https://ocfl.io/1.1/spec/#inventory\""));
        assert!(text.contains("\"digestAlgorithm\": \"sha512\""));
        assert!(text.contains("\"head\": \"v2\""));
        assert!(!text.contains("contentDirectory"));
        assert!(!text.contains("writable"));
    }

    #[test]
    fn digest_covers_written_bytes() {
        let (bytes, digest) = sample().to_json_with_digest().unwrap();
        assert_eq!(digest, digest_bytes(DigestAlgorithm::Sha512, &bytes));
    }

    #[test]
    fn versions_order_numerically() {
        let mut inv = Inventory::new("o", SpecVersion::V1_1, DigestAlgorithm::Sha256, None).unwrap();
        for _ in 0..10 {
            inv.new_version("", "", "").unwrap();
            inv.finish_version();
        }
        let bytes = inv.to_json().unwrap();
        let back = Inventory::from_json(&bytes).unwrap();
        let names: Vec<String> = back.versions().keys().map(VersionNumber::to_string).collect();
        assert_eq!(names.first().map(String::as_str), Some("v1"));
        assert_eq!(names.last().map(String::as_str), Some("v10"));
        assert_eq!(back.head().number(), 10);
    }

    #[test]
    fn rejects_unknown_keys() {
        let mut value: serde_json::Value = serde_json::from_slice(&sample().to_json().unwrap()).unwrap();
        value["extra"] = serde_json::json!(true);
        let bytes = serde_json::to_vec(&value).unwrap();
        assert!(Inventory::from_json(&bytes).is_err());
    }
}
