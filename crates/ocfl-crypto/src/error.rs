use ocfl_types::ErrorList;

/// Errors from digest and ingestion operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Reading the input stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// One or more fan-out consumers failed.
    #[error("fan-out consumers failed: {0}")]
    Consumers(ErrorList),

    /// A fan-out consumer thread panicked.
    #[error("fan-out consumer '{0}' panicked")]
    ConsumerPanicked(String),

    /// A digest sidecar does not follow `DIGEST inventory.json`.
    #[error("malformed digest sidecar: {0}")]
    MalformedSidecar(String),
}

/// Result alias for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
