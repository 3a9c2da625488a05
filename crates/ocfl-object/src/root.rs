use std::sync::Arc;

use ocfl_crypto::INVENTORY_FILE;
use ocfl_extension::{config_path, Extension, ExtensionRegistry, EXTENSIONS_DIR};
use ocfl_inventory::Inventory;
use ocfl_store::{FileSystem, FsResult};
use ocfl_types::path::join;
use ocfl_types::SpecVersion;
use ocfl_validation::{Code, ValidationSession};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::check::{check_object, read_optional};
use crate::config::{ObjectConfig, StorageRootConfig};
use crate::declaration::{is_declaration, Declaration};
use crate::error::{OcflError, OcflResult};
use crate::object::Object;

/// Storage root layout description file.
pub const LAYOUT_FILE: &str = "ocfl_layout.json";

/// Content of `ocfl_layout.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutDescription {
    pub extension: String,
    pub description: String,
}

// ---------------------------------------------------------------------------
// StorageRoot
// ---------------------------------------------------------------------------

/// A directory tree of objects arranged by one layout extension.
///
/// Distinct objects may be opened and updated from distinct threads; each
/// gets its own filesystem scope.
#[derive(Debug)]
pub struct StorageRoot {
    fs: Arc<dyn FileSystem>,
    registry: Arc<ExtensionRegistry>,
    layout: Option<Arc<dyn Extension>>,
    spec: SpecVersion,
    description: Option<String>,
}

impl StorageRoot {
    /// Declare a new storage root in an empty scope.
    pub fn init(
        fs: Arc<dyn FileSystem>,
        config: &StorageRootConfig,
        registry: Arc<ExtensionRegistry>,
    ) -> OcflResult<Self> {
        if !fs.read_dir("").map(|e| e.is_empty()).unwrap_or(true) {
            return Err(OcflError::NotEmpty(fs.location()));
        }
        let layout = registry.create(config.layout.clone())?;
        if layout.as_storage_root_path().is_none() {
            return Err(OcflError::Layout(format!("{} does not map identifiers", layout.name())));
        }

        let description = config
            .description
            .clone()
            .unwrap_or_else(|| format!("Objects arranged by {}", layout.name()));
        let document = LayoutDescription {
            extension: layout.name().to_string(),
            description: description.clone(),
        };
        Declaration::Root.write(fs.as_ref(), config.spec_version)?;
        fs.write_all(LAYOUT_FILE, &serde_json::to_vec_pretty(&document)?)?;
        fs.write_all(&config_path(layout.name()), &serde_json::to_vec_pretty(&layout.config())?)?;

        info!(location = %fs.location(), layout = layout.name(), spec = %config.spec_version, "initialised storage root");
        Ok(Self {
            fs,
            registry,
            layout: Some(layout),
            spec: config.spec_version,
            description: Some(description),
        })
    }

    /// Open an existing storage root.
    ///
    /// A root without `ocfl_layout.json` can still be listed and checked,
    /// but objects cannot be located by identifier.
    pub fn load(fs: Arc<dyn FileSystem>, registry: Arc<ExtensionRegistry>) -> OcflResult<Self> {
        let spec = match Declaration::Root.read(fs.as_ref()) {
            Ok(Some(spec)) => spec,
            Ok(None) => return Err(OcflError::NotAStorageRoot(fs.location())),
            Err(e) if e.is_not_found() => return Err(OcflError::NotAStorageRoot(fs.location())),
            Err(e) => return Err(e.into()),
        };

        let (layout, description) = match read_optional(fs.as_ref(), LAYOUT_FILE)? {
            None => {
                warn!(location = %fs.location(), "storage root has no {LAYOUT_FILE}");
                (None, None)
            }
            Some(bytes) => {
                let document: LayoutDescription = serde_json::from_slice(&bytes)?;
                let layout = match read_optional(fs.as_ref(), &config_path(&document.extension))? {
                    Some(config) => registry.create(serde_json::from_slice(&config)?)?,
                    None => registry.create_default(&document.extension)?,
                };
                (Some(layout), Some(document.description))
            }
        };

        debug!(location = %fs.location(), %spec, "loaded storage root");
        Ok(Self {
            fs,
            registry,
            layout,
            spec,
            description,
        })
    }

    pub fn spec_version(&self) -> SpecVersion {
        self.spec
    }

    pub fn layout(&self) -> Option<&Arc<dyn Extension>> {
        self.layout.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn location(&self) -> String {
        self.fs.location()
    }

    pub fn registry(&self) -> &Arc<ExtensionRegistry> {
        &self.registry
    }

    /// Path of the object `id` relative to the root.
    pub fn object_path(&self, id: &str) -> OcflResult<String> {
        let layout = self
            .layout
            .as_ref()
            .ok_or_else(|| OcflError::Layout(format!("{} has no layout", self.fs.location())))?;
        let mapper = layout
            .as_storage_root_path()
            .ok_or_else(|| OcflError::Layout(format!("{} does not map identifiers", layout.name())))?;
        Ok(mapper.build_storage_root_path(id)?)
    }

    // -- objects ------------------------------------------------------------

    /// Prepare a new object at the layout path of `id`.
    pub fn create_object(&self, id: &str, config: &ObjectConfig) -> OcflResult<Object> {
        let path = self.object_path(id)?;
        let scope = self.fs.sub(&path)?;
        if scope.exists(INVENTORY_FILE)? {
            return Err(OcflError::ObjectExists(path));
        }
        Object::create(scope, id, config, Arc::clone(&self.registry))
    }

    /// Load the object `id`.
    pub fn open_object(&self, id: &str) -> OcflResult<Object> {
        let path = self.object_path(id)?;
        let scope = self.fs.sub(&path)?;
        if !scope.exists(INVENTORY_FILE)? {
            return Err(OcflError::ObjectNotFound(id.to_string()));
        }
        let object = Object::load(scope, Arc::clone(&self.registry))?;
        if object.id() != id {
            return Err(OcflError::IdMismatch {
                expected: id.to_string(),
                found: object.id().to_string(),
            });
        }
        Ok(object)
    }

    /// Load the object `id`, or prepare it if it does not exist yet.
    pub fn open_or_create_object(&self, id: &str, config: &ObjectConfig) -> OcflResult<Object> {
        match self.open_object(id) {
            Err(OcflError::ObjectNotFound(_)) => self.create_object(id, config),
            other => other,
        }
    }

    /// Relative paths of every object root, sorted.
    ///
    /// A directory holding any file is taken to be an object root; its
    /// subtree is not searched further.
    pub fn object_paths(&self) -> OcflResult<Vec<String>> {
        let mut paths = Vec::new();
        let mut empty = Vec::new();
        for entry in self.fs.read_dir("")? {
            if entry.is_dir && entry.name != EXTENSIONS_DIR {
                find_objects(self.fs.as_ref(), &entry.name, &mut paths, &mut empty)?;
            }
        }
        Ok(paths)
    }

    /// Identifiers of every object, in path order.
    pub fn object_ids(&self) -> OcflResult<Vec<String>> {
        let mut ids = Vec::new();
        for path in self.object_paths()? {
            let bytes = self.fs.read_all(&join(&[&path, INVENTORY_FILE]))?;
            ids.push(Inventory::from_json(&bytes)?.id().to_string());
        }
        Ok(ids)
    }

    // -- validation ---------------------------------------------------------

    /// Check the root and every object below it.
    pub fn check(&self, session: &mut ValidationSession) -> OcflResult<()> {
        check_root(self.fs.as_ref(), &self.registry, session)
    }

    /// Check one object, located through the layout.
    pub fn check_object(&self, id: &str, session: &mut ValidationSession) -> OcflResult<()> {
        let path = self.object_path(id)?;
        let scope = self.fs.sub(&path)?;
        if !scope.exists("")? {
            return Err(OcflError::ObjectNotFound(id.to_string()));
        }
        session.set_scope(Some(id.to_string()));
        let result = check_object(scope.as_ref(), &self.registry, session);
        session.set_scope(None);
        result.map(|_| ())
    }
}

/// Check the storage root at `fs` and every object below it.
///
/// Works on roots that cannot be loaded; a missing declaration is a
/// finding, not an error.
pub fn check_root(
    fs: &dyn FileSystem,
    registry: &ExtensionRegistry,
    session: &mut ValidationSession,
) -> OcflResult<()> {
    let entries = fs.read_dir("")?;
    let spec = Declaration::Root
        .check(fs, &entries, SpecVersion::default(), session)?
        .unwrap_or_default();

    let layout = check_layout(fs, spec, registry, session)?;

    if entries.iter().any(|e| e.is_dir && e.name == EXTENSIONS_DIR) {
        for entry in fs.read_dir(EXTENSIONS_DIR)? {
            if !entry.is_dir {
                session.error(spec, Code::E067, format!("file {} in storage root extensions directory", entry.name));
            } else if !registry.is_known(&entry.name) {
                session.warning(spec, Code::W016, format!("unregistered extension {}", entry.name));
            }
        }
    }

    let mut objects = Vec::new();
    let mut empty = Vec::new();
    for entry in &entries {
        if entry.is_dir && entry.name != EXTENSIONS_DIR {
            find_objects(fs, &entry.name, &mut objects, &mut empty)?;
        } else if !entry.is_dir && !is_declaration(&entry.name) && entry.name != LAYOUT_FILE {
            debug!(file = %entry.name, "ignoring file in storage root");
        }
    }
    for dir in empty {
        session.error(spec, Code::E073, format!("empty directory {dir}"));
    }

    for path in &objects {
        let scope = fs.sub(path)?;
        session.set_scope(Some(path.clone()));
        let inventory = check_object(scope.as_ref(), registry, session)?;
        if let Some(inventory) = inventory {
            if let Ok(object_spec) = inventory.spec_version() {
                if object_spec > spec {
                    session.error(
                        spec,
                        Code::E081,
                        format!("object declares {object_spec}, storage root declares {spec}"),
                    );
                }
            }
            if let Some(mapper) = layout.as_ref().and_then(|l| l.as_storage_root_path()) {
                match mapper.build_storage_root_path(inventory.id()) {
                    Ok(expected) if expected == *path => {}
                    Ok(expected) => session.warning(
                        spec,
                        Code::W014,
                        format!("object {} is at {path}, layout places it at {expected}", inventory.id()),
                    ),
                    Err(e) => session.warning(spec, Code::W014, format!("layout cannot place {}: {e}", inventory.id())),
                }
            }
        }
    }
    session.set_scope(None);
    info!(location = %fs.location(), objects = objects.len(), findings = session.len(), "storage root checked");
    Ok(())
}

/// Validate `ocfl_layout.json` and build its layout when possible.
fn check_layout(
    fs: &dyn FileSystem,
    spec: SpecVersion,
    registry: &ExtensionRegistry,
    session: &mut ValidationSession,
) -> OcflResult<Option<Arc<dyn Extension>>> {
    let Some(bytes) = read_optional(fs, LAYOUT_FILE)? else {
        return Ok(None);
    };
    let document: LayoutDescription = match serde_json::from_slice(&bytes) {
        Ok(document) => document,
        Err(e) => {
            session.error(spec, Code::E070, format!("{LAYOUT_FILE}: {e}"));
            return Ok(None);
        }
    };
    if !registry.is_supported(&document.extension) {
        warn!(extension = %document.extension, "layout extension not supported");
        return Ok(None);
    }
    let built = match read_optional(fs, &config_path(&document.extension))? {
        Some(config) => serde_json::from_slice(&config)
            .map_err(Into::into)
            .and_then(|config| registry.create(config)),
        None => registry.create_default(&document.extension),
    };
    match built {
        Ok(layout) => Ok(Some(layout)),
        Err(e) => {
            warn!(extension = %document.extension, error = %e, "layout unusable");
            Ok(None)
        }
    }
}

/// Descend from `dir` collecting object roots and empty directories.
fn find_objects(fs: &dyn FileSystem, dir: &str, objects: &mut Vec<String>, empty: &mut Vec<String>) -> FsResult<()> {
    let entries = fs.read_dir(dir)?;
    if entries.is_empty() {
        empty.push(dir.to_string());
        return Ok(());
    }
    if entries.iter().any(|e| !e.is_dir) {
        objects.push(dir.to_string());
        return Ok(());
    }
    for entry in entries {
        find_objects(fs, &join(&[dir, &entry.name]), objects, empty)?;
    }
    Ok(())
}
