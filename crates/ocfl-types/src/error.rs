use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown OCFL specification version: {0}")]
    UnknownSpecVersion(String),

    #[error("invalid version directory name: {0}")]
    InvalidVersion(String),

    #[error("version {0} cannot be incremented without changing its zero-padding width")]
    VersionOverflow(String),

    #[error("unknown digest algorithm: {0}")]
    UnknownDigestAlgorithm(String),
}
