//! Error types for the inventory crate.

use ocfl_types::{PathViolation, TypeError};

/// Errors that can occur while building or mutating an inventory.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    /// A mutation was attempted without an open version.
    #[error("inventory of {0} is not writable; start a new version first")]
    NotWritable(String),

    /// `new_version` was called while a version is already open.
    #[error("inventory of {0} already has an open version")]
    AlreadyWritable(String),

    /// The logical path is not part of the head version.
    #[error("logical path not found in head version: {0}")]
    PathNotFound(String),

    /// The logical path is already part of the head version.
    #[error("logical path already exists in head version: {0}")]
    PathExists(String),

    /// A path breaks the logical or content path rules.
    #[error("invalid path {path:?}: {violation}")]
    InvalidPath {
        path: String,
        violation: PathViolation,
    },

    /// A path would be both a file and a directory of another path.
    #[error("path {path:?} conflicts with {other:?}")]
    PathConflict { path: String, other: String },

    /// A reference-only add named a digest with no stored content.
    #[error("digest {0} has no content in the manifest")]
    MissingContent(String),

    /// The content directory name is not usable.
    #[error("invalid content directory: {0:?}")]
    InvalidContentDirectory(String),

    /// The primary digest algorithm cannot be used for content addressing.
    #[error("{0} cannot be used as the primary digest algorithm")]
    UnsupportedDigestAlgorithm(String),

    /// The inventory has no versions.
    #[error("inventory of {0} has no versions")]
    Empty(String),

    /// A type-level error (version naming, spec tag).
    #[error(transparent)]
    Type(#[from] TypeError),

    /// JSON encoding or decoding failed.
    #[error("inventory JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for inventory results.
pub type InventoryResult<T> = Result<T, InventoryError>;
