//! Foundation types for OCFL (Oxford Common File Layout) storage.
//!
//! This crate provides the small vocabulary shared by every
//! other OCFL crate in the workspace.
//!
//! # Key Types
//!
//! - [`SpecVersion`] -- OCFL specification revision (`1.0`, `1.1`, `2.0`)
//! - [`VersionNumber`] -- Object version directory name (`v1`, `v002`, ...)
//! - [`DigestAlgorithm`] -- Named content-addressing / fixity hash function
//! - [`ErrorList`] -- Append-only aggregate of independent failures
//! - [`path`] -- Logical and content path rules shared by writers and validators

pub mod digest;
pub mod error;
pub mod error_list;
pub mod path;
pub mod spec;
pub mod version;

pub use digest::DigestAlgorithm;
pub use error::TypeError;
pub use error_list::ErrorList;
pub use path::PathViolation;
pub use spec::SpecVersion;
pub use version::VersionNumber;
