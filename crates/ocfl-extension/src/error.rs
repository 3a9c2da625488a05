//! Error types for the extension crate.

use ocfl_store::FsError;
use ocfl_types::ErrorList;

/// Errors that can occur while building or applying extensions.
#[derive(Debug, thiserror::Error)]
pub enum ExtensionError {
    /// No constructor is registered for the name.
    #[error("extension not supported: {0}")]
    NotSupported(String),

    /// A configuration has no `extensionName` string.
    #[error("extension configuration has no extensionName")]
    MissingName,

    /// A configuration could not be understood.
    #[error("invalid configuration for {name}: {reason}")]
    InvalidConfig { name: String, reason: String },

    /// The same extension was activated twice.
    #[error("extension already active: {0}")]
    AlreadyActive(String),

    /// An identifier cannot be mapped by a layout.
    #[error("{name} cannot map identifier {id:?}: {reason}")]
    InvalidIdentifier {
        name: String,
        id: String,
        reason: String,
    },

    /// A single path element exceeds the configured maximum.
    #[error("filename too long ({len} > {max} bytes): {element}")]
    FilenameTooLong {
        element: String,
        len: usize,
        max: usize,
    },

    /// A whole path exceeds the configured maximum.
    #[error("pathname too long ({len} > {max} bytes)")]
    PathnameTooLong { len: usize, max: usize },

    /// A content hook refused a change.
    #[error("{name} rejected {path}: {reason}")]
    Rejected {
        name: String,
        path: String,
        reason: String,
    },

    /// Several independent extensions failed.
    #[error("{0}")]
    Aggregate(ErrorList),

    /// Reading or writing extension configuration failed.
    #[error(transparent)]
    Fs(#[from] FsError),

    /// Configuration JSON could not be encoded or decoded.
    #[error("extension JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExtensionError {
    pub(crate) fn config(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias for extension results.
pub type ExtensionResult<T> = Result<T, ExtensionError>;
