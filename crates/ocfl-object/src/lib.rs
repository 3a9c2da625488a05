//! OCFL objects and storage roots.
//!
//! # Key Types
//!
//! - [`Object`] -- a versioned object: staged updates, commits, reads
//! - [`StorageRoot`] -- a tree of objects arranged by a layout extension
//! - [`ObjectConfig`] / [`StorageRootConfig`] -- creation parameters
//! - [`Declaration`] -- NAMASTE conformance declarations
//!
//! Every operation works against an [`ocfl_store::FileSystem`] scope, so the
//! same code drives local directories and in-memory trees. Validation
//! ([`check_object`], [`check_root`]) records findings in an
//! [`ocfl_validation::ValidationSession`] rather than failing on the first
//! problem; only I/O failures surface as errors.

pub mod check;
pub mod config;
pub mod declaration;
pub mod error;
pub mod object;
pub mod root;

pub use check::{check_object, LOGS_DIR};
pub use config::{ObjectConfig, StorageRootConfig};
pub use declaration::Declaration;
pub use error::{OcflError, OcflResult};
pub use object::Object;
pub use root::{check_root, LayoutDescription, StorageRoot, LAYOUT_FILE};
