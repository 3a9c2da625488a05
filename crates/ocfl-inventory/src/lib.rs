//! The OCFL inventory: an object's identity, content manifest and version
//! history.
//!
//! # Key Types
//!
//! - [`Inventory`] -- the persistent state machine behind every object
//! - [`Version`] -- one entry of the version history
//! - [`User`] -- provenance of a version
//!
//! The mutation API ([`Inventory::new_version`], [`Inventory::add_file`],
//! [`Inventory::delete_file`], [`Inventory::rename_file`],
//! [`Inventory::clean`]) only touches the open head version. Content is
//! deduplicated through the manifest: adding a file whose digest is already
//! stored records a reference instead of a second copy.

pub mod check;
pub mod codec;
pub mod error;
pub mod inventory;
pub mod model;

pub use check::{compare_prior, parse_checked};
pub use error::{InventoryError, InventoryResult};
pub use inventory::{valid_content_directory, DEFAULT_CONTENT_DIRECTORY};
pub use model::{DigestMap, Inventory, User, Version};
