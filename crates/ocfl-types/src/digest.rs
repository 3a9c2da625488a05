use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A named digest algorithm from the OCFL controlled vocabulary or the
/// digest-algorithms extension registry.
///
/// Names serialize exactly as they appear in inventories (`"sha512"`,
/// `"blake2b-160"`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    #[serde(rename = "md5")]
    Md5,
    #[serde(rename = "sha1")]
    Sha1,
    #[serde(rename = "sha256")]
    Sha256,
    #[serde(rename = "sha512")]
    Sha512,
    #[serde(rename = "blake2b-160")]
    Blake2b160,
    #[serde(rename = "blake2b-256")]
    Blake2b256,
    #[serde(rename = "blake2b-384")]
    Blake2b384,
    #[serde(rename = "blake2b-512")]
    Blake2b512,
    #[serde(rename = "blake3")]
    Blake3,
}

impl DigestAlgorithm {
    /// Every supported algorithm.
    pub const ALL: [DigestAlgorithm; 9] = [
        Self::Md5,
        Self::Sha1,
        Self::Sha256,
        Self::Sha512,
        Self::Blake2b160,
        Self::Blake2b256,
        Self::Blake2b384,
        Self::Blake2b512,
        Self::Blake3,
    ];

    /// The inventory name of this algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
            Self::Blake2b160 => "blake2b-160",
            Self::Blake2b256 => "blake2b-256",
            Self::Blake2b384 => "blake2b-384",
            Self::Blake2b512 => "blake2b-512",
            Self::Blake3 => "blake3",
        }
    }

    /// Output size in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 | Self::Blake2b160 => 20,
            Self::Sha256 | Self::Blake2b256 | Self::Blake3 => 32,
            Self::Blake2b384 => 48,
            Self::Sha512 | Self::Blake2b512 => 64,
        }
    }

    /// Length of the lower-case hex encoding.
    pub fn hex_len(&self) -> usize {
        self.output_len() * 2
    }

    /// Returns `true` for algorithms permitted as an inventory's primary
    /// `digestAlgorithm` (content addressing).
    pub fn is_content_addressing(&self) -> bool {
        matches!(self, Self::Sha256 | Self::Sha512)
    }

    /// Returns `true` if `digest` is a well-formed hex digest for this algorithm.
    pub fn is_valid_digest(&self, digest: &str) -> bool {
        digest.len() == self.hex_len() && digest.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl Default for DigestAlgorithm {
    fn default() -> Self {
        Self::Sha512
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.name() == s)
            .ok_or_else(|| TypeError::UnknownDigestAlgorithm(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_roundtrip() {
        for alg in DigestAlgorithm::ALL {
            assert_eq!(alg.name().parse::<DigestAlgorithm>().unwrap(), alg);
        }
    }

    #[test]
    fn unknown_name() {
        let err = "crc32".parse::<DigestAlgorithm>().unwrap_err();
        assert_eq!(err, TypeError::UnknownDigestAlgorithm("crc32".into()));
    }

    #[test]
    fn serde_names_match_inventory_vocabulary() {
        let json = serde_json::to_string(&DigestAlgorithm::Blake2b160).unwrap();
        assert_eq!(json, "\"blake2b-160\"");
        let parsed: DigestAlgorithm = serde_json::from_str("\"sha256\"").unwrap();
        assert_eq!(parsed, DigestAlgorithm::Sha256);
    }

    #[test]
    fn content_addressing_algorithms() {
        assert!(DigestAlgorithm::Sha512.is_content_addressing());
        assert!(DigestAlgorithm::Sha256.is_content_addressing());
        assert!(!DigestAlgorithm::Md5.is_content_addressing());
        assert!(!DigestAlgorithm::Blake3.is_content_addressing());
    }

    #[test]
    fn digest_shape() {
        let md5 = "5d41402abc4b2a76b9719d911017c592";
        assert!(DigestAlgorithm::Md5.is_valid_digest(md5));
        assert!(!DigestAlgorithm::Sha1.is_valid_digest(md5));
        assert!(!DigestAlgorithm::Md5.is_valid_digest("zz41402abc4b2a76b9719d911017c592"));
    }
}
