//! Conformance checks for an object as stored.
//!
//! [`check_object`] reads everything through the filesystem scope and
//! records findings in the session. Missing or unreadable OCFL structures
//! become findings; only failures of the storage itself are returned as
//! errors.

use std::collections::{BTreeMap, BTreeSet};

use ocfl_crypto::{digest_bytes, ingest, parse_sidecar, sidecar_name, INVENTORY_FILE};
use ocfl_extension::{ExtensionRegistry, EXTENSIONS_DIR};
use ocfl_inventory::{compare_prior, parse_checked, Inventory};
use ocfl_store::{DirEntry, FileSystem, FsResult};
use ocfl_types::path::join;
use ocfl_types::{DigestAlgorithm, SpecVersion, VersionNumber};
use ocfl_validation::{Code, Severity, ValidationSession};
use tracing::debug;

use crate::declaration::{is_declaration, Declaration};
use crate::error::OcflResult;

/// Directory reserved for object logs.
pub const LOGS_DIR: &str = "logs";

/// Check the object rooted at `fs`.
///
/// Returns the root inventory when it could be parsed, so that callers
/// checking a whole storage root can relate the object to its location.
pub fn check_object(
    fs: &dyn FileSystem,
    registry: &ExtensionRegistry,
    session: &mut ValidationSession,
) -> OcflResult<Option<Inventory>> {
    let entries = fs.read_dir("")?;
    let declared = Declaration::Object.check(fs, &entries, SpecVersion::default(), session)?;
    let spec = declared.unwrap_or_default();

    let Some(root_bytes) = read_optional(fs, INVENTORY_FILE)? else {
        session.error(spec, Code::E063, "object root has no inventory.json");
        return Ok(None);
    };
    let Some(inventory) = parse_checked(&root_bytes, spec, session) else {
        return Ok(None);
    };
    inventory.check(session);

    let spec = inventory.spec_version().unwrap_or(spec);
    if let Some(declared) = declared {
        if declared != spec {
            session.error(
                spec,
                Code::E038,
                format!("inventory type is {} but the object declares {declared}", inventory.type_uri()),
            );
        }
    }

    check_sidecar(fs, "", &root_bytes, inventory.digest_algorithm(), spec, session)?;
    check_root_entries(fs, &entries, &inventory, spec, registry, session)?;
    for version in inventory.versions().keys() {
        check_version_dir(fs, *version, &inventory, &root_bytes, spec, session)?;
    }
    check_content(fs, &inventory, spec, session)?;

    debug!(id = inventory.id(), location = %fs.location(), "object checked");
    Ok(Some(inventory))
}

// ---------------------------------------------------------------------------
// Object root
// ---------------------------------------------------------------------------

fn check_root_entries(
    fs: &dyn FileSystem,
    entries: &[DirEntry],
    inventory: &Inventory,
    spec: SpecVersion,
    registry: &ExtensionRegistry,
    session: &mut ValidationSession,
) -> OcflResult<()> {
    let sidecar = sidecar_name(inventory.digest_algorithm());
    for entry in entries {
        let name = entry.name.as_str();
        let expected = if entry.is_dir {
            name == EXTENSIONS_DIR || name == LOGS_DIR || is_version_dir(inventory, name)
        } else {
            name == INVENTORY_FILE || name == sidecar || is_declaration(name)
        };
        if !expected {
            let kind = if entry.is_dir { "directory" } else { "file" };
            session.error(spec, Code::E001, format!("unexpected {kind} {name} in object root"));
        }
    }

    for version in inventory.versions().keys() {
        let name = version.to_string();
        if !entries.iter().any(|e| e.is_dir && e.name == name) {
            session.error(spec, Code::E008, format!("version directory {name} is missing"));
        }
    }

    if entries.iter().any(|e| e.is_dir && e.name == EXTENSIONS_DIR) {
        for entry in fs.read_dir(EXTENSIONS_DIR)? {
            if !entry.is_dir {
                session.error(spec, Code::E067, format!("file {} in extensions directory", entry.name));
            } else if !registry.is_known(&entry.name) {
                session.warning(spec, Code::W013, format!("unregistered extension {}", entry.name));
            }
        }
    }
    Ok(())
}

fn is_version_dir(inventory: &Inventory, name: &str) -> bool {
    name.parse::<VersionNumber>()
        .is_ok_and(|v| inventory.version(v).is_some() && v.to_string() == name)
}

// ---------------------------------------------------------------------------
// Version directories
// ---------------------------------------------------------------------------

fn check_version_dir(
    fs: &dyn FileSystem,
    version: VersionNumber,
    inventory: &Inventory,
    root_bytes: &[u8],
    spec: SpecVersion,
    session: &mut ValidationSession,
) -> OcflResult<()> {
    let dir = version.to_string();
    if !fs.is_dir(&dir)? {
        return Ok(());
    }

    for entry in fs.read_dir(&dir)? {
        if entry.is_dir {
            if entry.name != inventory.content_directory() {
                session.warning(spec, Code::W002, format!("unexpected directory {dir}/{}", entry.name));
            }
        } else if entry.name != INVENTORY_FILE && !is_sidecar_name(&entry.name) {
            session.error(spec, Code::E015, format!("unexpected file {dir}/{}", entry.name));
        }
    }

    let path = join(&[&dir, INVENTORY_FILE]);
    let Some(bytes) = read_optional(fs, &path)? else {
        session.warning(spec, Code::W010, format!("version {dir} has no inventory"));
        return Ok(());
    };

    let mut scratch = ValidationSession::new();
    let prior = parse_checked(&bytes, spec, &mut scratch);
    if let Some(prior) = &prior {
        prior.check(&mut scratch);
    }
    relay(&scratch, &path, session);
    let Some(prior) = prior else {
        return Ok(());
    };

    check_sidecar(fs, &dir, &bytes, prior.digest_algorithm(), spec, session)?;
    if prior.head() != version {
        session.error(spec, Code::E040, format!("{path} has head {}", prior.head()));
    }
    if version == inventory.head() {
        if bytes != root_bytes {
            session.error(spec, Code::E064, format!("{path} differs from the root inventory"));
        }
    } else {
        compare_prior(inventory, &prior, session);
    }
    Ok(())
}

fn is_sidecar_name(name: &str) -> bool {
    name.strip_prefix(INVENTORY_FILE)
        .and_then(|rest| rest.strip_prefix('.'))
        .is_some_and(|alg| alg.parse::<DigestAlgorithm>().is_ok())
}

/// Re-record findings from a version inventory, prefixed with its path.
fn relay(scratch: &ValidationSession, path: &str, session: &mut ValidationSession) {
    for entry in scratch.entries() {
        let context = format!("{path}: {}", entry.context);
        match entry.severity {
            Severity::Error => session.error(entry.spec, entry.code, context),
            Severity::Warning => session.warning(entry.spec, entry.code, context),
        }
    }
}

// ---------------------------------------------------------------------------
// Sidecars
// ---------------------------------------------------------------------------

fn check_sidecar(
    fs: &dyn FileSystem,
    dir: &str,
    bytes: &[u8],
    algorithm: DigestAlgorithm,
    spec: SpecVersion,
    session: &mut ValidationSession,
) -> OcflResult<()> {
    let path = join(&[dir, &sidecar_name(algorithm)]);
    let Some(content) = read_optional(fs, &path)? else {
        session.error(spec, Code::E058, format!("{path} is missing"));
        return Ok(());
    };
    let stated = match parse_sidecar(&String::from_utf8_lossy(&content)) {
        Ok(stated) => stated,
        Err(e) => {
            session.error(spec, Code::E061, format!("{path}: {e}"));
            return Ok(());
        }
    };
    let actual = digest_bytes(algorithm, bytes);
    if stated != actual {
        session.error(spec, Code::E060, format!("{path} states {stated}, inventory digest is {actual}"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

fn check_content(
    fs: &dyn FileSystem,
    inventory: &Inventory,
    spec: SpecVersion,
    session: &mut ValidationSession,
) -> OcflResult<()> {
    let mut on_disk = BTreeSet::new();
    let mut empty = Vec::new();
    for version in inventory.versions().keys() {
        let content = join(&[&version.to_string(), inventory.content_directory()]);
        if fs.is_dir(&content)? {
            scan(fs, &content, &mut on_disk, &mut empty)?;
        }
    }

    for dir in &empty {
        session.error(spec, Code::E024, format!("empty directory {dir}"));
    }

    let manifest: BTreeSet<String> = inventory.content_paths().map(|(p, _)| p.to_string()).collect();
    for path in on_disk.difference(&manifest) {
        session.error(spec, Code::E092, format!("file {path} is not in the manifest"));
    }
    for path in manifest.difference(&on_disk) {
        session.error(spec, Code::E092, format!("manifest lists {path}, which does not exist"));
    }

    let expected = expected_digests(inventory);
    for path in manifest.intersection(&on_disk) {
        let Some(wanted) = expected.get(path.as_str()) else {
            continue;
        };
        let algorithms: Vec<DigestAlgorithm> = wanted.iter().map(|(alg, _, _)| *alg).collect();
        let actual = ingest(fs.open(path)?, &algorithms, None)?;
        for (algorithm, digest, code) in wanted {
            let Some(found) = actual.digest(*algorithm) else {
                continue;
            };
            if found != digest.as_str() {
                session.error(spec, *code, format!("{algorithm} digest of {path} is {found}, inventory says {digest}"));
            }
        }
    }

    if let Some(fixity) = inventory.fixity() {
        for (algorithm, block) in fixity {
            for path in block.values().flatten() {
                if manifest.contains(path) && !on_disk.contains(path) {
                    session.error(spec, Code::E093, format!("fixity {algorithm} lists missing file {path}"));
                }
            }
        }
    }
    Ok(())
}

/// Every digest the inventory states for each content path: the manifest
/// digest (E092 on mismatch) followed by any fixity digests (E093).
fn expected_digests(inventory: &Inventory) -> BTreeMap<&str, Vec<(DigestAlgorithm, String, Code)>> {
    let mut expected: BTreeMap<&str, Vec<_>> = BTreeMap::new();
    for (path, digest) in inventory.content_paths() {
        expected
            .entry(path)
            .or_default()
            .push((inventory.digest_algorithm(), digest.to_lowercase(), Code::E092));
    }
    for (name, block) in inventory.fixity().into_iter().flatten() {
        // Unsupported algorithms cannot be verified here.
        let Ok(algorithm) = name.parse::<DigestAlgorithm>() else {
            continue;
        };
        for (digest, paths) in block {
            for path in paths {
                if let Some(wanted) = expected.get_mut(path.as_str()) {
                    if !wanted.iter().any(|(alg, _, _)| *alg == algorithm) {
                        wanted.push((algorithm, digest.to_lowercase(), Code::E093));
                    }
                }
            }
        }
    }
    expected
}

/// Collect every file below `dir`, and every directory with no entries.
fn scan(fs: &dyn FileSystem, dir: &str, files: &mut BTreeSet<String>, empty: &mut Vec<String>) -> FsResult<()> {
    let entries = fs.read_dir(dir)?;
    if entries.is_empty() {
        empty.push(dir.to_string());
    }
    for entry in entries {
        let path = join(&[dir, &entry.name]);
        if entry.is_dir {
            scan(fs, &path, files, empty)?;
        } else {
            files.insert(path);
        }
    }
    Ok(())
}

pub(crate) fn read_optional(fs: &dyn FileSystem, path: &str) -> FsResult<Option<Vec<u8>>> {
    match fs.read_all(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ocfl_crypto::format_sidecar;
    use ocfl_store::MemoryFs;

    use super::*;
    use crate::config::ObjectConfig;
    use crate::object::Object;

    fn registry() -> Arc<ExtensionRegistry> {
        Arc::new(ExtensionRegistry::with_builtins())
    }

    /// Two committed versions: `a.txt`, `b/c.txt`, then `a.txt` changed.
    fn sample() -> MemoryFs {
        let fs = MemoryFs::new();
        let mut obj = Object::create(Arc::new(fs.clone()), "urn:example:sample", &ObjectConfig::default(), registry()).unwrap();
        obj.start_update("one", "Ann", "mailto:ann@example.org").unwrap();
        obj.add_bytes("a.txt", b"alpha").unwrap();
        obj.add_bytes("b/c.txt", b"gamma").unwrap();
        obj.commit().unwrap();
        obj.start_update("two", "Ann", "mailto:ann@example.org").unwrap();
        obj.add_bytes("a.txt", b"alpha 2").unwrap();
        obj.commit().unwrap();
        fs
    }

    fn check(fs: &MemoryFs) -> ValidationSession {
        let mut session = ValidationSession::new();
        check_object(fs, &registry(), &mut session).unwrap();
        session
    }

    #[test]
    fn valid_object_has_no_findings() {
        let session = check(&sample());
        assert!(session.is_empty(), "{session}");
    }

    #[test]
    fn orphan_file_is_reported_once() {
        let fs = sample();
        fs.write_all("v1/content/orphan.txt", b"stray").unwrap();
        let session = check(&fs);
        assert_eq!(session.count(Code::E092), 1, "{session}");
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn missing_content_file() {
        let fs = sample();
        fs.remove("v1/content/b/c.txt").unwrap();
        let session = check(&fs);
        assert_eq!(session.count(Code::E092), 1);
    }

    #[test]
    fn modified_content_is_detected() {
        let fs = sample();
        fs.write_all("v1/content/a.txt", b"TAMPERED").unwrap();
        let session = check(&fs);
        assert!(session.has(Code::E092), "{session}");
        assert!(!session.is_valid());
    }

    fn with_fixity() -> MemoryFs {
        let fs = MemoryFs::new();
        let config = ObjectConfig { fixity: vec![DigestAlgorithm::Md5], ..ObjectConfig::default() };
        let mut obj = Object::create(Arc::new(fs.clone()), "urn:example:fixity", &config, registry()).unwrap();
        obj.start_update("one", "Ann", "mailto:ann@example.org").unwrap();
        obj.add_bytes("a.txt", b"alpha").unwrap();
        obj.commit().unwrap();
        fs
    }

    #[test]
    fn fixity_digests_are_verified() {
        let fs = with_fixity();
        assert!(check(&fs).is_empty());

        fs.write_all("v1/content/a.txt", b"TAMPERED").unwrap();
        let session = check(&fs);
        assert!(session.has(Code::E092), "{session}");
        assert!(session.has(Code::E093), "{session}");
    }

    #[test]
    fn wrong_fixity_value() {
        let fs = with_fixity();
        let md5 = digest_bytes(DigestAlgorithm::Md5, b"alpha");
        let altered = fs.read_to_string("inventory.json").unwrap().replace(&md5, &"0".repeat(32));
        let sidecar = format_sidecar(&digest_bytes(DigestAlgorithm::Sha512, altered.as_bytes()));
        for dir in ["", "v1/"] {
            fs.write_all(&format!("{dir}inventory.json"), altered.as_bytes()).unwrap();
            fs.write_all(&format!("{dir}inventory.json.sha512"), sidecar.as_bytes()).unwrap();
        }

        let session = check(&fs);
        assert_eq!(session.count(Code::E093), 1, "{session}");
        assert!(!session.has(Code::E092));
    }

    #[test]
    fn missing_inventory() {
        let fs = MemoryFs::new();
        fs.write_all("0=ocfl_object_1.1", b"ocfl_object_1.1\n").unwrap();
        let session = check(&fs);
        assert!(session.has(Code::E063));
    }

    #[test]
    fn missing_declaration() {
        let fs = sample();
        fs.remove("0=ocfl_object_1.1").unwrap();
        assert!(check(&fs).has(Code::E003));
    }

    #[test]
    fn sidecar_problems() {
        let fs = sample();
        fs.write_all("inventory.json.sha512", format_sidecar(&"a".repeat(128)).as_bytes())
            .unwrap();
        assert!(check(&fs).has(Code::E060));

        fs.write_all("inventory.json.sha512", b"not a sidecar").unwrap();
        assert!(check(&fs).has(Code::E061));

        fs.remove("v1/inventory.json.sha512").unwrap();
        assert!(check(&fs).has(Code::E058));
    }

    #[test]
    fn head_inventory_must_match_root() {
        let fs = sample();
        let mut bytes = fs.read_all("v2/inventory.json").unwrap();
        bytes.push(b'\n');
        fs.write_all("v2/inventory.json", &bytes).unwrap();
        let session = check(&fs);
        assert!(session.has(Code::E064));
        assert!(session.has(Code::E060));
    }

    #[test]
    fn missing_version_inventory_is_a_warning() {
        let fs = sample();
        fs.remove("v1/inventory.json").unwrap();
        fs.remove("v1/inventory.json.sha512").unwrap();
        let session = check(&fs);
        assert!(session.has(Code::W010));
        assert!(session.is_valid());
    }

    #[test]
    fn unexpected_entries() {
        let fs = sample();
        fs.write_all("notes.txt", b"").unwrap();
        fs.write_all("v1/extra.txt", b"").unwrap();
        fs.write_all("v1/other/x", b"").unwrap();
        fs.write_all("extensions/loose.txt", b"").unwrap();
        fs.create_dir("extensions/9999-unknown").unwrap();
        fs.create_dir("v2/content/empty").unwrap();
        let session = check(&fs);
        assert!(session.has(Code::E001));
        assert!(session.has(Code::E015));
        assert!(session.has(Code::W002));
        assert!(session.has(Code::E067));
        assert!(session.has(Code::W013));
        assert!(session.has(Code::E024));
    }

    #[test]
    fn version_directory_missing() {
        let fs = sample();
        for path in fs.paths().into_iter().filter(|p| p.starts_with("v1/")) {
            fs.remove(&path).unwrap();
        }
        let session = check(&fs);
        assert!(session.has(Code::E008));
        assert!(session.has(Code::E092));
    }

    #[test]
    fn prior_inventory_disagreement() {
        let fs = sample();
        let original = fs.read_to_string("v1/inventory.json").unwrap();
        let altered = original.replace("\"one\"", "\"changed\"");
        fs.write_all("v1/inventory.json", altered.as_bytes()).unwrap();
        let sidecar = format_sidecar(&digest_bytes(DigestAlgorithm::Sha512, altered.as_bytes()));
        fs.write_all("v1/inventory.json.sha512", sidecar.as_bytes()).unwrap();

        let session = check(&fs);
        assert!(session.has(Code::W011), "{session}");
        assert!(session.is_valid());
    }
}
