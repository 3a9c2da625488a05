use std::collections::BTreeMap;
use std::io::Read;
use std::sync::Arc;

use ocfl_crypto::{digest_bytes, format_sidecar, ingest, parse_sidecar, sidecar_name, CryptoError, INVENTORY_FILE};
use ocfl_extension::{ExtensionManager, ExtensionRegistry, ObjectState};
use ocfl_inventory::Inventory;
use ocfl_store::FileSystem;
use ocfl_types::{DigestAlgorithm, SpecVersion, VersionNumber};
use ocfl_validation::ValidationSession;
use serde_json::Value;
use tracing::{debug, info};

use crate::check::check_object;
use crate::config::ObjectConfig;
use crate::declaration::Declaration;
use crate::error::{OcflError, OcflResult};

// ---------------------------------------------------------------------------
// Object
// ---------------------------------------------------------------------------

/// One OCFL object rooted at a filesystem scope.
///
/// An object is read-only until [`Object::start_update`] opens a new head
/// version. Content added while the version is open is written straight to
/// its final location under `<head>/<contentDirectory>`; the inventories
/// are written by [`Object::commit`]. An object is not safe for concurrent
/// mutation; distinct objects may be used from distinct threads.
#[derive(Debug)]
pub struct Object {
    fs: Arc<dyn FileSystem>,
    registry: Arc<ExtensionRegistry>,
    inventory: Inventory,
    extensions: ExtensionManager,
    fixity: Vec<DigestAlgorithm>,
    spec: SpecVersion,
    committed: bool,
}

impl Object {
    /// Prepare a new object in an empty scope. Nothing is written until the
    /// first [`commit`](Self::commit).
    pub fn create(
        fs: Arc<dyn FileSystem>,
        id: &str,
        config: &ObjectConfig,
        registry: Arc<ExtensionRegistry>,
    ) -> OcflResult<Self> {
        if fs.exists(INVENTORY_FILE)? {
            return Err(OcflError::ObjectExists(fs.location()));
        }
        let inventory = Inventory::new(
            id,
            config.spec_version,
            config.digest_algorithm,
            config.content_directory.as_deref(),
        )?;
        let mut extensions = ExtensionManager::new();
        for ext in &config.extensions {
            extensions.add(registry.create(ext.clone())?)?;
        }
        debug!(id, location = %fs.location(), "prepared new object");
        Ok(Self {
            fs,
            registry,
            inventory,
            extensions,
            fixity: config.fixity.clone(),
            spec: config.spec_version,
            committed: false,
        })
    }

    /// Load a committed object, verifying the root inventory sidecar.
    pub fn load(fs: Arc<dyn FileSystem>, registry: Arc<ExtensionRegistry>) -> OcflResult<Self> {
        let bytes = match fs.read_all(INVENTORY_FILE) {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => return Err(OcflError::ObjectNotFound(fs.location())),
            Err(e) => return Err(e.into()),
        };
        let inventory = Inventory::from_json(&bytes)?;
        verify_sidecar(fs.as_ref(), "", &bytes, inventory.digest_algorithm())?;
        let spec = inventory.spec_version()?;

        let (extensions, _unknown) = ExtensionManager::load(fs.as_ref(), &registry)?;
        let fixity: Vec<DigestAlgorithm> = inventory
            .fixity()
            .map(|blocks| blocks.keys().filter_map(|name| name.parse().ok()).collect())
            .unwrap_or_default();

        debug!(id = inventory.id(), head = %inventory.head(), "loaded object");
        Ok(Self {
            fs,
            registry,
            inventory,
            extensions,
            fixity,
            spec,
            committed: true,
        })
    }

    // -- accessors ----------------------------------------------------------

    pub fn id(&self) -> &str {
        self.inventory.id()
    }

    pub fn head(&self) -> VersionNumber {
        self.inventory.head()
    }

    pub fn spec_version(&self) -> SpecVersion {
        self.spec
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn extensions(&self) -> &ExtensionManager {
        &self.extensions
    }

    pub fn location(&self) -> String {
        self.fs.location()
    }

    pub fn is_writable(&self) -> bool {
        self.inventory.is_writable()
    }

    /// Returns `true` once at least one version is on storage.
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Digest algorithms recorded in the fixity block for new content.
    pub fn fixity_algorithms(&self) -> Vec<DigestAlgorithm> {
        let primary = self.inventory.digest_algorithm();
        let mut algorithms: Vec<DigestAlgorithm> = self
            .fixity
            .iter()
            .copied()
            .chain(self.extensions.fixity_algorithms())
            .filter(|a| *a != primary)
            .collect();
        algorithms.sort();
        algorithms.dedup();
        algorithms
    }

    // -- updates ------------------------------------------------------------

    /// Open a new head version seeded with the current head state.
    pub fn start_update(&mut self, message: &str, user_name: &str, user_address: &str) -> OcflResult<VersionNumber> {
        if self.inventory.is_writable() {
            return Err(OcflError::AlreadyWritable(self.id().to_string()));
        }
        let version = self.inventory.new_version(message, user_name, user_address)?;
        info!(id = self.id(), %version, "started update");
        Ok(version)
    }

    /// Stream content for `logical` into the open version and return its
    /// digest.
    ///
    /// Content whose digest is already stored is not kept twice: the
    /// written copy is removed and the logical path references the stored
    /// one.
    pub fn add_reader<R: Read>(&mut self, logical: &str, reader: R) -> OcflResult<String> {
        self.require_writable()?;
        let updating = self.head_digest(logical).is_some();
        if updating {
            self.extensions.before_update(logical)?;
        } else {
            self.extensions.before_add(logical)?;
        }

        let sanitized = self.extensions.object_content_path(logical)?;
        let physical = self.free_content_path(logical, &sanitized)?;

        let primary = self.inventory.digest_algorithm();
        let fixity = self.fixity_algorithms();
        let mut algorithms = vec![primary];
        algorithms.extend(fixity.iter().copied());

        let sink = self.fs.create(&physical)?;
        let result = match ingest(reader, &algorithms, Some(sink)) {
            Ok(result) => result,
            Err(e) => {
                self.discard(&physical)?;
                return Err(e.into());
            }
        };
        let digest = result
            .digest(primary)
            .map(str::to_string)
            .ok_or_else(|| CryptoError::ConsumerPanicked(primary.to_string()))?;

        let recorded = if self.inventory.is_duplicate(&digest) {
            self.discard(&physical)?;
            debug!(logical, %digest, "content already stored");
            self.inventory.add_file(logical, "", &digest)
        } else {
            self.inventory.add_file(logical, &physical, &digest)
        };
        if let Err(e) = recorded {
            if self.fs.exists(&physical)? {
                self.discard(&physical)?;
            }
            return Err(e.into());
        }
        if self.inventory.content_path(&digest) == Some(physical.as_str()) {
            for algorithm in &fixity {
                if let Some(value) = result.digest(*algorithm) {
                    self.inventory.add_fixity(&physical, *algorithm, value)?;
                }
            }
        }

        if updating {
            self.extensions.after_update(logical, &digest)?;
        } else {
            self.extensions.after_add(logical, &digest)?;
        }
        Ok(digest)
    }

    /// [`add_reader`](Self::add_reader) over an in-memory buffer.
    pub fn add_bytes(&mut self, logical: &str, data: &[u8]) -> OcflResult<String> {
        self.add_reader(logical, data)
    }

    /// Remove `logical` from the open version. Returns `true` if it was
    /// present.
    pub fn delete_file(&mut self, logical: &str) -> OcflResult<bool> {
        self.require_writable()?;
        self.extensions.before_delete(logical)?;
        let removed = self.inventory.delete_file(logical)?;
        if removed {
            self.extensions.after_delete(logical)?;
        }
        Ok(removed)
    }

    /// Rename `from` to `to` in the open version without touching content.
    pub fn rename_file(&mut self, from: &str, to: &str) -> OcflResult<()> {
        self.require_writable()?;
        let digest = self
            .head_digest(from)
            .map(str::to_string)
            .ok_or_else(|| OcflError::FileNotFound {
                id: self.id().to_string(),
                path: from.to_string(),
                version: self.head(),
            })?;
        self.extensions.before_delete(from)?;
        self.extensions.before_add(to)?;
        self.inventory.rename_file(from, to)?;
        self.extensions.after_delete(from)?;
        self.extensions.after_add(to, &digest)?;
        Ok(())
    }

    /// Write the open version out and make the object read-only again.
    ///
    /// An open version that changed nothing is dropped instead of written,
    /// unless it is the object's first. Returns the committed version, or
    /// `None` when nothing was written. Committing a read-only object does
    /// nothing.
    pub fn commit(&mut self) -> OcflResult<Option<VersionNumber>> {
        if !self.inventory.is_writable() {
            return Ok(None);
        }
        for path in self.inventory.prune_unreferenced()? {
            if self.fs.exists(&path)? {
                self.discard(&path)?;
            }
        }
        if self.inventory.clean()? {
            self.inventory.finish_version();
            info!(id = self.id(), "nothing changed; update discarded");
            return Ok(None);
        }

        let head = self.inventory.head();
        let (bytes, digest) = self.inventory.to_json_with_digest()?;
        let sidecar = sidecar_name(self.inventory.digest_algorithm());
        let content = format_sidecar(&digest);
        self.fs.write_all(&format!("{head}/{INVENTORY_FILE}"), &bytes)?;
        self.fs.write_all(&format!("{head}/{sidecar}"), content.as_bytes())?;
        self.fs.write_all(INVENTORY_FILE, &bytes)?;
        self.fs.write_all(&sidecar, content.as_bytes())?;

        if !self.committed {
            Declaration::Object.write(self.fs.as_ref(), self.spec)?;
        }
        if !self.extensions.is_empty() {
            self.extensions.store(self.fs.as_ref())?;
        }

        self.inventory.finish_version();
        self.committed = true;
        info!(id = self.id(), version = %head, "committed version");
        Ok(Some(head))
    }

    /// Commit and release the object.
    pub fn close(mut self) -> OcflResult<()> {
        self.commit().map(|_| ())
    }

    // -- reads --------------------------------------------------------------

    /// Logical path to digest for `version` (head when `None`).
    pub fn files(&self, version: Option<VersionNumber>) -> OcflResult<BTreeMap<String, String>> {
        let version = self.resolve_version(version)?;
        Ok(self.inventory.files(Some(version)))
    }

    /// Open `logical` as it was in `version` (head when `None`).
    pub fn read_file(&self, logical: &str, version: Option<VersionNumber>) -> OcflResult<Box<dyn Read + Send>> {
        let (_, physical) = self.locate(logical, version)?;
        Ok(self.fs.open(&physical)?)
    }

    /// Copy every file of `version` (head when `None`) into `target` under
    /// its logical path, verifying each digest on the way. Returns the
    /// number of files written.
    pub fn extract(&self, version: Option<VersionNumber>, target: &dyn FileSystem) -> OcflResult<usize> {
        let version = self.resolve_version(version)?;
        let algorithm = self.inventory.digest_algorithm();
        let files = self.inventory.files(Some(version));
        for (logical, expected) in &files {
            let (_, physical) = self.locate(logical, Some(version))?;
            let reader = self.fs.open(&physical)?;
            let result = ingest(reader, &[algorithm], Some(target.create(logical)?))?;
            let actual = result.digest(algorithm).unwrap_or_default();
            if actual != expected {
                return Err(OcflError::DigestMismatch {
                    path: physical,
                    expected: expected.clone(),
                    actual: actual.to_string(),
                });
            }
        }
        info!(id = self.id(), %version, files = files.len(), target = %target.location(), "extracted version");
        Ok(files.len())
    }

    /// Metadata derived by the active metadata extensions, keyed by
    /// extension name.
    pub fn metadata(&self) -> OcflResult<BTreeMap<String, Value>> {
        let state = ObjectState {
            id: self.id().to_string(),
            head: self.head().to_string(),
            digest_algorithm: self.inventory.digest_algorithm(),
            versions: self.inventory.versions().len(),
            files: self.inventory.files(None),
        };
        Ok(self.extensions.metadata(&state)?)
    }

    /// Validate the object as stored.
    pub fn check(&self, session: &mut ValidationSession) -> OcflResult<()> {
        check_object(self.fs.as_ref(), &self.registry, session)?;
        Ok(())
    }

    // -- internal -----------------------------------------------------------

    fn require_writable(&self) -> OcflResult<()> {
        if self.inventory.is_writable() {
            Ok(())
        } else {
            Err(OcflError::NotWritable(self.id().to_string()))
        }
    }

    fn head_digest(&self, logical: &str) -> Option<&str> {
        self.inventory.head_version().and_then(|v| v.digest_of(logical))
    }

    fn resolve_version(&self, version: Option<VersionNumber>) -> OcflResult<VersionNumber> {
        let version = version.unwrap_or_else(|| self.head());
        if self.inventory.version(version).is_none() {
            return Err(OcflError::VersionNotFound {
                id: self.id().to_string(),
                version,
            });
        }
        Ok(version)
    }

    /// Digest and content path of `logical` in `version`.
    fn locate(&self, logical: &str, version: Option<VersionNumber>) -> OcflResult<(String, String)> {
        let version = self.resolve_version(version)?;
        let not_found = || OcflError::FileNotFound {
            id: self.id().to_string(),
            path: logical.to_string(),
            version,
        };
        let digest = self
            .inventory
            .version(version)
            .and_then(|v| v.digest_of(logical))
            .ok_or_else(not_found)?;
        let physical = self.inventory.content_path(digest).ok_or_else(not_found)?;
        Ok((digest.to_string(), physical.to_string()))
    }

    /// Remove a content file and any directories it leaves empty.
    /// The content path new bytes for `logical` are written to.
    ///
    /// Content written earlier in the open version that only `logical`
    /// refers to is dropped first. When another live file was cleaned to
    /// the same name, a numbered sibling (`name~1.ext`) is used instead.
    /// Files the manifest does not know about are never overwritten.
    fn free_content_path(&mut self, logical: &str, sanitized: &str) -> OcflResult<String> {
        let physical = self.inventory.build_realname(sanitized);
        if !self.fs.exists(&physical)? || self.release_draft(logical, &physical)? {
            return Ok(physical);
        }
        if !self.inventory.content_paths().any(|(p, _)| p == physical) {
            return Err(OcflError::ContentExists(physical));
        }
        let mut n = 1;
        loop {
            let candidate = numbered(&physical, n);
            if !self.fs.exists(&candidate)? {
                debug!(logical, path = %candidate, "content name taken; using a numbered one");
                return Ok(candidate);
            }
            n += 1;
        }
    }

    /// Drop the content at `physical` if it was written in the open version
    /// and nothing but `logical` refers to it. Returns `true` once the path
    /// is free.
    fn release_draft(&mut self, logical: &str, physical: &str) -> OcflResult<bool> {
        if !physical.starts_with(&format!("{}/", self.head())) {
            return Ok(false);
        }
        let Some(digest) = self
            .inventory
            .content_paths()
            .find(|(p, _)| *p == physical)
            .map(|(_, d)| d.to_string())
        else {
            return Ok(false);
        };
        let referents: Vec<String> = self
            .inventory
            .head_version()
            .and_then(|v| v.state.get(&digest))
            .cloned()
            .unwrap_or_default();
        if referents.iter().any(|p| p != logical) {
            return Ok(false);
        }

        if !referents.is_empty() {
            self.inventory.delete_file(logical)?;
        }
        for path in self.inventory.prune_unreferenced()? {
            if self.fs.exists(&path)? {
                self.discard(&path)?;
            }
        }
        debug!(logical, physical, "superseded content dropped");
        Ok(!self.fs.exists(physical)?)
    }

    fn discard(&self, physical: &str) -> OcflResult<()> {
        self.fs.remove(physical)?;
        let mut dir = physical;
        while let Some((parent, _)) = dir.rsplit_once('/') {
            match self.fs.read_dir(parent) {
                Ok(entries) if entries.is_empty() => self.fs.remove_dir(parent)?,
                Ok(_) => break,
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e.into()),
            }
            dir = parent;
        }
        Ok(())
    }
}

/// Compare an inventory's sidecar in `dir` with the digest of `bytes`.
pub(crate) fn verify_sidecar(
    fs: &dyn FileSystem,
    dir: &str,
    bytes: &[u8],
    algorithm: DigestAlgorithm,
) -> OcflResult<()> {
    let path = ocfl_types::path::join(&[dir, &sidecar_name(algorithm)]);
    let stated = parse_sidecar(&fs.read_to_string(&path)?)?;
    let actual = digest_bytes(algorithm, bytes);
    if stated != actual {
        return Err(OcflError::SidecarMismatch {
            path: ocfl_types::path::join(&[dir, INVENTORY_FILE]),
            stated,
            actual,
        });
    }
    Ok(())
}

/// `dir/name~n.ext` for `dir/name.ext`.
fn numbered(path: &str, n: u32) -> String {
    let (dir, file) = match path.rsplit_once('/') {
        Some((dir, file)) => (format!("{dir}/"), file),
        None => (String::new(), path),
    };
    match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{dir}{stem}~{n}.{ext}"),
        _ => format!("{dir}{file}~{n}"),
    }
}
