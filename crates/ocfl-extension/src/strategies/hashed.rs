//! Hash-bucketed storage layouts.

use ocfl_crypto::digest_bytes;
use ocfl_types::DigestAlgorithm;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ExtensionError, ExtensionResult};
use crate::extension::{parse_algorithm, parse_config, Extension, StorageRootPath};

pub const HASH_AND_ID_NAME: &str = "0003-hash-and-id-n-tuple-storage-layout";
pub const HASHED_N_TUPLE_NAME: &str = "0004-hashed-n-tuple-storage-layout";

/// Longest encoded identifier kept verbatim by the hash-and-id layout.
const MAX_ENCODED_ID: usize = 100;

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TupleConfig {
    digest_algorithm: String,
    tuple_size: usize,
    number_of_tuples: usize,
    short_object_root: bool,
}

impl Default for TupleConfig {
    fn default() -> Self {
        Self {
            digest_algorithm: "sha256".into(),
            tuple_size: 3,
            number_of_tuples: 3,
            short_object_root: false,
        }
    }
}

/// Validated tuple parameters shared by both layouts.
#[derive(Clone, Copy, Debug)]
struct Tuples {
    algorithm: DigestAlgorithm,
    size: usize,
    count: usize,
}

impl Tuples {
    fn from_config(name: &str, config: &TupleConfig) -> ExtensionResult<Self> {
        let algorithm = parse_algorithm(name, &config.digest_algorithm)?;
        if (config.tuple_size == 0) != (config.number_of_tuples == 0) {
            return Err(ExtensionError::config(
                name,
                "tupleSize and numberOfTuples must both be zero or both be positive",
            ));
        }
        if config.tuple_size * config.number_of_tuples > algorithm.hex_len() {
            return Err(ExtensionError::config(
                name,
                format!("{} tuples of {} exceed a {algorithm} digest", config.number_of_tuples, config.tuple_size),
            ));
        }
        Ok(Self {
            algorithm,
            size: config.tuple_size,
            count: config.number_of_tuples,
        })
    }

    /// The hex digest of `id` and its leading tuple directories.
    fn split(&self, id: &str) -> (String, Vec<String>) {
        let digest = digest_bytes(self.algorithm, id.as_bytes());
        let tuples = (0..self.count)
            .map(|i| digest[i * self.size..(i + 1) * self.size].to_string())
            .collect();
        (digest, tuples)
    }

    fn consumed(&self) -> usize {
        self.size * self.count
    }
}

// ---------------------------------------------------------------------------
// Hashed n-tuple (0004)
// ---------------------------------------------------------------------------

/// `hash(id)` split into tuple directories, followed by the full hash or
/// (with `shortObjectRoot`) the part of it not used by the tuples.
#[derive(Debug)]
pub struct HashedNTuple {
    config: TupleConfig,
    tuples: Tuples,
}

impl HashedNTuple {
    pub fn from_config(config: Value) -> ExtensionResult<Self> {
        let config: TupleConfig = parse_config(HASHED_N_TUPLE_NAME, config)?;
        let tuples = Tuples::from_config(HASHED_N_TUPLE_NAME, &config)?;
        if config.short_object_root && tuples.consumed() >= tuples.algorithm.hex_len() {
            return Err(ExtensionError::config(
                HASHED_N_TUPLE_NAME,
                "shortObjectRoot needs digest characters left over after the tuples",
            ));
        }
        Ok(Self { config, tuples })
    }
}

impl Extension for HashedNTuple {
    fn name(&self) -> &str {
        HASHED_N_TUPLE_NAME
    }

    fn config(&self) -> Value {
        json!({
            "extensionName": HASHED_N_TUPLE_NAME,
            "digestAlgorithm": self.config.digest_algorithm,
            "tupleSize": self.config.tuple_size,
            "numberOfTuples": self.config.number_of_tuples,
            "shortObjectRoot": self.config.short_object_root,
        })
    }

    fn as_storage_root_path(&self) -> Option<&dyn StorageRootPath> {
        Some(self)
    }
}

impl StorageRootPath for HashedNTuple {
    fn build_storage_root_path(&self, id: &str) -> ExtensionResult<String> {
        let (digest, mut parts) = self.tuples.split(id);
        let last = if self.config.short_object_root {
            digest[self.tuples.consumed()..].to_string()
        } else {
            digest
        };
        parts.push(last);
        Ok(parts.join("/"))
    }
}

// ---------------------------------------------------------------------------
// Hash and id n-tuple (0003)
// ---------------------------------------------------------------------------

/// `hash(id)` split into tuple directories, followed by the percent-encoded
/// identifier.
#[derive(Debug)]
pub struct HashAndIdNTuple {
    config: TupleConfig,
    tuples: Tuples,
}

impl HashAndIdNTuple {
    pub fn from_config(config: Value) -> ExtensionResult<Self> {
        let config: TupleConfig = parse_config(HASH_AND_ID_NAME, config)?;
        let tuples = Tuples::from_config(HASH_AND_ID_NAME, &config)?;
        Ok(Self { config, tuples })
    }
}

/// Percent-encode every byte outside `[A-Za-z0-9_-]` as lower-case `%xx`.
pub fn percent_encode_id(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for b in id.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("%{b:02x}"));
        }
    }
    out
}

impl Extension for HashAndIdNTuple {
    fn name(&self) -> &str {
        HASH_AND_ID_NAME
    }

    fn config(&self) -> Value {
        json!({
            "extensionName": HASH_AND_ID_NAME,
            "digestAlgorithm": self.config.digest_algorithm,
            "tupleSize": self.config.tuple_size,
            "numberOfTuples": self.config.number_of_tuples,
        })
    }

    fn as_storage_root_path(&self) -> Option<&dyn StorageRootPath> {
        Some(self)
    }
}

impl StorageRootPath for HashAndIdNTuple {
    fn build_storage_root_path(&self, id: &str) -> ExtensionResult<String> {
        let (digest, mut parts) = self.tuples.split(id);
        let mut encoded = percent_encode_id(id);
        if encoded.len() > MAX_ENCODED_ID {
            encoded.truncate(MAX_ENCODED_ID);
            encoded.push('-');
            encoded.push_str(&digest);
        }
        parts.push(encoded);
        Ok(parts.join("/"))
    }
}
