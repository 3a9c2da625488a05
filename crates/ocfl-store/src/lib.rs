//! Scoped filesystem abstraction for OCFL storage.
//!
//! The OCFL engine never touches `std::fs` directly. Storage roots and
//! objects operate on a [`FileSystem`] scope: a directory tree addressed by
//! relative, `/`-separated paths, from which narrower scopes can be derived
//! with [`FileSystem::sub`].
//!
//! # Backends
//!
//! - [`LocalFs`] -- a directory on the local disk
//! - [`MemoryFs`] -- `BTreeMap`-backed tree for tests and embedding
//!
//! # Design Rules
//!
//! 1. Paths are relative to the scope root; `..` and absolute paths are rejected.
//! 2. `create` makes missing parent directories and truncates existing files.
//! 3. Directory listings are sorted by name.
//! 4. Writers must be flushed; dropping an unflushed local writer may lose data.

pub mod error;
pub mod local;
pub mod memory;
pub mod traits;

pub use error::{FsError, FsResult};
pub use local::LocalFs;
pub use memory::MemoryFs;
pub use traits::{normalize, DirEntry, FileSystem};
