/// Errors from filesystem operations.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// The requested file or directory does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The path escapes the scope or is otherwise unusable.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// A directory operation was attempted on a file.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// I/O error from the underlying backend.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    /// Wrap an I/O error with the path it occurred at.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::NotFound(path);
        }
        Self::Io { path, source }
    }

    /// Returns `true` for [`FsError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result alias for filesystem operations.
pub type FsResult<T> = Result<T, FsError>;
