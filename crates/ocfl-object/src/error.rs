//! Error types for objects and storage roots.

use ocfl_crypto::CryptoError;
use ocfl_extension::ExtensionError;
use ocfl_inventory::InventoryError;
use ocfl_store::FsError;
use ocfl_types::{TypeError, VersionNumber};

/// Errors that can occur while reading or writing objects and storage roots.
#[derive(Debug, thiserror::Error)]
pub enum OcflError {
    /// No object with this identifier exists.
    #[error("object not found: {0}")]
    ObjectNotFound(String),

    /// An object already exists where a new one was requested.
    #[error("object already exists at {0}")]
    ObjectExists(String),

    /// The location holds no storage root declaration.
    #[error("not an OCFL storage root: {0}")]
    NotAStorageRoot(String),

    /// The location is not empty and cannot be initialised.
    #[error("{0} is not empty")]
    NotEmpty(String),

    /// The object has no open version.
    #[error("object {0} is not open for update")]
    NotWritable(String),

    /// The object already has an open version.
    #[error("object {0} is already open for update")]
    AlreadyWritable(String),

    /// The object has never been committed.
    #[error("object {0} has no committed versions")]
    Uncommitted(String),

    /// The requested version does not exist.
    #[error("object {id} has no version {version}")]
    VersionNotFound { id: String, version: VersionNumber },

    /// The logical path is not part of the requested version.
    #[error("object {id} has no file {path} in {version}")]
    FileNotFound {
        id: String,
        path: String,
        version: VersionNumber,
    },

    /// A content path is already occupied by another file.
    #[error("content path already in use: {0}")]
    ContentExists(String),

    /// The inventory at a location belongs to another object.
    #[error("expected object {expected}, found {found}")]
    IdMismatch { expected: String, found: String },

    /// An inventory's sidecar does not state the digest of its bytes.
    #[error("sidecar of {path} states {stated}, inventory digest is {actual}")]
    SidecarMismatch {
        path: String,
        stated: String,
        actual: String,
    },

    /// Content read back does not have its recorded digest.
    #[error("{path} has digest {actual}, expected {expected}")]
    DigestMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// The storage root has no usable layout extension.
    #[error("storage root layout unavailable: {0}")]
    Layout(String),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Extension(#[from] ExtensionError),

    #[error(transparent)]
    Fs(#[from] FsError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for object and storage root results.
pub type OcflResult<T> = Result<T, OcflError>;
