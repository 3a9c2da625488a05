//! Pairtree layouts.
//!
//! Identifier to path conversion follows the Pairtree convention: bytes
//! outside visible ASCII and a small set of rare characters are written as
//! `^hh`, then `/`, `:` and `.` become `=`, `+` and `,`, and the result is
//! cut into `shortyLength`-character directories.

use ocfl_crypto::digest_bytes;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ExtensionError, ExtensionResult};
use crate::extension::{parse_algorithm, parse_config, Extension, StorageRootPath};

pub const PAIRTREE_NAME: &str = "NNNN-pairtree-storage-layout";
pub const SHARDED_PAIRTREE_NAME: &str = "NNNN-sharded-pairtree-storage-layout";

const RARE: &[u8] = b"\"*+,<=>?\\^|";

/// Escape and substitute an identifier into its pairtree-clean form.
pub fn pairtree_clean(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for b in id.bytes() {
        if !(0x21..=0x7e).contains(&b) || RARE.contains(&b) {
            out.push_str(&format!("^{b:02x}"));
            continue;
        }
        out.push(match b {
            b'/' => '=',
            b':' => '+',
            b'.' => ',',
            other => char::from(other),
        });
    }
    out
}

/// Split a cleaned identifier into `shorty`-character segments.
fn chop(cleaned: &str, shorty: usize) -> String {
    cleaned
        .as_bytes()
        .chunks(shorty)
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PairTreeConfig {
    shorty_length: usize,
    digest_algorithm: String,
}

impl Default for PairTreeConfig {
    fn default() -> Self {
        Self {
            shorty_length: 2,
            digest_algorithm: "sha256".into(),
        }
    }
}

fn check_shorty(name: &str, config: &PairTreeConfig) -> ExtensionResult<()> {
    if config.shorty_length == 0 {
        return Err(ExtensionError::config(name, "shortyLength must be positive"));
    }
    Ok(())
}

fn empty_id(name: &str) -> ExtensionError {
    ExtensionError::InvalidIdentifier {
        name: name.into(),
        id: String::new(),
        reason: "identifier is empty".into(),
    }
}

// ---------------------------------------------------------------------------
// Pairtree
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct PairTree {
    config: PairTreeConfig,
}

impl PairTree {
    pub fn from_config(config: Value) -> ExtensionResult<Self> {
        let config: PairTreeConfig = parse_config(PAIRTREE_NAME, config)?;
        check_shorty(PAIRTREE_NAME, &config)?;
        Ok(Self { config })
    }

    /// Map an identifier to its pairtree path.
    pub fn id_to_path(&self, id: &str) -> String {
        chop(&pairtree_clean(id), self.config.shorty_length)
    }
}

impl Extension for PairTree {
    fn name(&self) -> &str {
        PAIRTREE_NAME
    }

    fn config(&self) -> Value {
        json!({
            "extensionName": PAIRTREE_NAME,
            "shortyLength": self.config.shorty_length,
        })
    }

    fn as_storage_root_path(&self) -> Option<&dyn StorageRootPath> {
        Some(self)
    }
}

impl StorageRootPath for PairTree {
    fn build_storage_root_path(&self, id: &str) -> ExtensionResult<String> {
        if id.is_empty() {
            return Err(empty_id(PAIRTREE_NAME));
        }
        Ok(self.id_to_path(id))
    }
}

// ---------------------------------------------------------------------------
// Sharded pairtree
// ---------------------------------------------------------------------------

/// Pairtree path below a hash-bucket directory taken from the first
/// `shortyLength` characters of `hash(id)`.
#[derive(Debug)]
pub struct ShardedPairTree {
    config: PairTreeConfig,
    algorithm: ocfl_types::DigestAlgorithm,
}

impl ShardedPairTree {
    pub fn from_config(config: Value) -> ExtensionResult<Self> {
        let config: PairTreeConfig = parse_config(SHARDED_PAIRTREE_NAME, config)?;
        check_shorty(SHARDED_PAIRTREE_NAME, &config)?;
        let algorithm = parse_algorithm(SHARDED_PAIRTREE_NAME, &config.digest_algorithm)?;
        if config.shorty_length > algorithm.hex_len() {
            return Err(ExtensionError::config(
                SHARDED_PAIRTREE_NAME,
                "shortyLength exceeds the digest length",
            ));
        }
        Ok(Self { config, algorithm })
    }
}

impl Extension for ShardedPairTree {
    fn name(&self) -> &str {
        SHARDED_PAIRTREE_NAME
    }

    fn config(&self) -> Value {
        json!({
            "extensionName": SHARDED_PAIRTREE_NAME,
            "shortyLength": self.config.shorty_length,
            "digestAlgorithm": self.config.digest_algorithm,
        })
    }

    fn as_storage_root_path(&self) -> Option<&dyn StorageRootPath> {
        Some(self)
    }
}

impl StorageRootPath for ShardedPairTree {
    fn build_storage_root_path(&self, id: &str) -> ExtensionResult<String> {
        if id.is_empty() {
            return Err(empty_id(SHARDED_PAIRTREE_NAME));
        }
        let digest = digest_bytes(self.algorithm, id.as_bytes());
        let shard = &digest[..self.config.shorty_length];
        let leaf = chop(&pairtree_clean(id), self.config.shorty_length);
        Ok(format!("{shard}/{leaf}"))
    }
}
