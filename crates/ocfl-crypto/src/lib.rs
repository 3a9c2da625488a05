//! Digest primitives for OCFL storage.
//!
//! Provides hashing for every supported [`DigestAlgorithm`], a fan-out
//! writer that streams content to storage while computing several digests
//! concurrently, and the `inventory.json.<algorithm>` sidecar format.
//!
//! All hash functions wrap established libraries; there is no custom cryptography.
//!
//! [`DigestAlgorithm`]: ocfl_types::DigestAlgorithm

pub mod error;
pub mod fanout;
pub mod hasher;
pub mod sidecar;

pub use error::{CryptoError, CryptoResult};
pub use fanout::{ingest, FanOutResult, FanOutWriter};
pub use hasher::{digest_bytes, digest_reader, Hasher};
pub use sidecar::{format_sidecar, parse_sidecar, sidecar_name, INVENTORY_FILE};
