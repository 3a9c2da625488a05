//! Extensions: named, configured strategies plugged into objects and
//! storage roots.
//!
//! An extension is located by the `extensionName` field of its JSON
//! configuration and may offer any subset of the capabilities in
//! [`Capability`]. Extensions are pure functions of their inputs and
//! configuration; they hold no per-object state.
//!
//! # Key Types
//!
//! - [`Extension`] -- a configured strategy and its capability views
//! - [`ExtensionRegistry`] -- name to constructor lookup
//! - [`ExtensionManager`] -- the ordered set active on one object or root
//!
//! Built-in strategies live in [`strategies`].

pub mod error;
pub mod extension;
pub mod manager;
pub mod registry;
pub mod strategies;

pub use error::{ExtensionError, ExtensionResult};
pub use extension::{
    extension_name, Capability, ContentChange, Extension, FixityDigest, Metadata, ObjectContentPath, ObjectState,
    StorageRootPath,
};
pub use manager::{config_path, ExtensionManager, CONFIG_FILE, EXTENSIONS_DIR, MANAGER_NAME};
pub use registry::{Constructor, ExtensionRegistry};
