//! Structural conformance checks for inventories.
//!
//! Checking happens in two passes. [`parse_checked`] first walks the raw
//! JSON so that missing keys, unknown keys and badly formed values are
//! reported with their own codes; only then is the typed [`Inventory`]
//! built. [`Inventory::check`] covers everything that needs the typed model:
//! version continuity, manifest and state cross references, path rules and
//! fixity. [`compare_prior`] checks a prior version's inventory against the
//! current one.

use std::collections::{HashMap, HashSet};

use chrono::DateTime;
use ocfl_types::path::{check_path, find_conflicts};
use ocfl_types::{DigestAlgorithm, PathViolation, SpecVersion, VersionNumber};
use ocfl_validation::{Code, ValidationSession};
use serde_json::{Map, Value};
use tracing::debug;

use crate::inventory::valid_content_directory;
use crate::model::{DigestMap, Inventory};

const INVENTORY_KEYS: [&str; 8] = [
    "id",
    "type",
    "digestAlgorithm",
    "head",
    "contentDirectory",
    "manifest",
    "versions",
    "fixity",
];
const VERSION_KEYS: [&str; 4] = ["created", "message", "state", "user"];

/// Parse inventory bytes, recording every conformance problem found.
///
/// `spec` is the revision the caller expects (from the object declaration);
/// it selects the catalogue for findings until the inventory's own `type`
/// is known. Returns `None` when no typed inventory could be built.
pub fn parse_checked(
    bytes: &[u8],
    spec: SpecVersion,
    session: &mut ValidationSession,
) -> Option<Inventory> {
    let value: Value = match serde_json::from_slice(bytes) {
        Ok(v) => v,
        Err(e) => {
            session.error(spec, Code::E033, format!("inventory is not valid JSON: {e}"));
            return None;
        }
    };
    let Some(root) = value.as_object() else {
        session.error(spec, Code::E033, "inventory is not a JSON object");
        return None;
    };

    let spec = root
        .get("type")
        .and_then(Value::as_str)
        .and_then(|t| SpecVersion::from_inventory_type(t).ok())
        .unwrap_or(spec);
    let clean = check_raw(root, spec, session);
    if !clean {
        debug!("inventory JSON has structural errors; typed parse skipped");
        return None;
    }

    match Inventory::from_json(bytes) {
        Ok(inventory) => Some(inventory),
        Err(e) => {
            session.error(spec, Code::E033, format!("inventory does not parse: {e}"));
            None
        }
    }
}

/// Raw JSON checks. Returns `false` if the typed parse cannot succeed.
fn check_raw(root: &Map<String, Value>, spec: SpecVersion, session: &mut ValidationSession) -> bool {
    let mut ok = true;

    for key in ["id", "type", "digestAlgorithm", "head"] {
        if !root.contains_key(key) {
            session.error(spec, Code::E036, format!("inventory is missing key {key:?}"));
            ok = false;
        }
    }
    for key in ["manifest", "versions"] {
        if !root.contains_key(key) {
            session.error(spec, Code::E041, format!("inventory is missing block {key:?}"));
            ok = false;
        }
    }
    for key in root.keys() {
        if !INVENTORY_KEYS.contains(&key.as_str()) {
            session.error(spec, Code::E102, format!("inventory has unknown key {key:?}"));
            ok = false;
        }
    }

    match root.get("id") {
        Some(Value::String(id)) => {
            if !looks_like_uri(id) {
                session.warning(spec, Code::W005, format!("id {id:?} is not a URI"));
            }
        }
        Some(_) => {
            session.error(spec, Code::E037, "id is not a string");
            ok = false;
        }
        None => {}
    }

    match root.get("type") {
        Some(Value::String(t)) if SpecVersion::from_inventory_type(t).is_ok() => {}
        Some(other) => {
            session.error(spec, Code::E038, format!("type {other} is not an OCFL inventory type"));
            ok = false;
        }
        None => {}
    }

    match root.get("digestAlgorithm").map(|v| v.as_str()) {
        Some(Some("sha512")) => {}
        Some(Some("sha256")) => {
            session.warning(spec, Code::W004, "digestAlgorithm is sha256");
        }
        Some(other) => {
            session.error(
                spec,
                Code::E025,
                format!("digestAlgorithm {} is not sha512 or sha256", other.unwrap_or("<non-string>")),
            );
            ok = false;
        }
        None => {}
    }

    match root.get("head") {
        Some(Value::String(h)) if h.parse::<VersionNumber>().is_ok() => {}
        Some(other) => {
            session.error(spec, Code::E040, format!("head {other} is not a version name"));
            ok = false;
        }
        None => {}
    }

    if let Some(cd) = root.get("contentDirectory") {
        match cd.as_str() {
            Some(dir) if valid_content_directory(dir) => {}
            Some(dir) if dir.contains('/') => {
                session.error(spec, Code::E017, format!("contentDirectory {dir:?} contains '/'"));
                ok = false;
            }
            Some(dir) => {
                session.error(spec, Code::E018, format!("contentDirectory {dir:?} is not allowed"));
                ok = false;
            }
            None => {
                session.error(spec, Code::E033, "contentDirectory is not a string");
                ok = false;
            }
        }
    }

    if let Some(manifest) = root.get("manifest") {
        ok &= check_raw_digest_map(manifest, "manifest", Code::E106, spec, session);
    }

    if let Some(fixity) = root.get("fixity") {
        match fixity.as_object() {
            Some(blocks) => {
                for (alg, block) in blocks {
                    ok &= check_raw_digest_map(block, &format!("fixity {alg}"), Code::E057, spec, session);
                }
            }
            None => {
                session.error(spec, Code::E111, "fixity is not a JSON object");
                ok = false;
            }
        }
    }

    if let Some(versions) = root.get("versions") {
        ok &= check_raw_versions(versions, spec, session);
    }

    ok
}

fn check_raw_digest_map(
    value: &Value,
    what: &str,
    code: Code,
    spec: SpecVersion,
    session: &mut ValidationSession,
) -> bool {
    let Some(map) = value.as_object() else {
        session.error(spec, code, format!("{what} is not a JSON object"));
        return false;
    };
    let mut ok = true;
    for (digest, paths) in map {
        let valid = paths
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_string));
        if !valid {
            session.error(spec, code, format!("{what} entry {digest} is not an array of paths"));
            ok = false;
        }
    }
    ok
}

fn check_raw_versions(value: &Value, spec: SpecVersion, session: &mut ValidationSession) -> bool {
    let Some(versions) = value.as_object() else {
        session.error(spec, Code::E044, "versions is not a JSON object");
        return false;
    };
    let mut ok = true;
    for (name, version) in versions {
        if name.parse::<VersionNumber>().is_err() {
            session.error(spec, Code::E104, format!("version name {name:?} is not v<number>"));
            ok = false;
        }
        let Some(block) = version.as_object() else {
            session.error(spec, Code::E046, format!("version {name} is not a JSON object"));
            ok = false;
            continue;
        };
        for key in block.keys() {
            if !VERSION_KEYS.contains(&key.as_str()) {
                session.error(spec, Code::E102, format!("version {name} has unknown key {key:?}"));
                ok = false;
            }
        }
        match block.get("created") {
            Some(Value::String(created)) => {
                if DateTime::parse_from_rfc3339(created).is_err() {
                    session.error(spec, Code::E048, format!("version {name} created {created:?} is not RFC3339"));
                    ok = false;
                }
            }
            Some(_) => {
                session.error(spec, Code::E048, format!("version {name} created is not a string"));
                ok = false;
            }
            None => {
                session.error(spec, Code::E047, format!("version {name} has no created key"));
                ok = false;
            }
        }
        match block.get("state") {
            Some(state) => {
                ok &= check_raw_digest_map(state, &format!("version {name} state"), Code::E050, spec, session);
            }
            None => {
                session.error(spec, Code::E047, format!("version {name} has no state key"));
                ok = false;
            }
        }
        match block.get("message") {
            None => session.warning(spec, Code::W007, format!("version {name} has no message")),
            Some(Value::String(_)) => {}
            Some(_) => {
                session.error(spec, Code::E094, format!("version {name} message is not a string"));
                ok = false;
            }
        }
        match block.get("user") {
            None => session.warning(spec, Code::W007, format!("version {name} has no user")),
            Some(Value::Object(user)) => {
                if !user.get("name").is_some_and(Value::is_string) {
                    session.error(spec, Code::E054, format!("version {name} user has no name"));
                    ok = false;
                }
                for key in user.keys() {
                    if key != "name" && key != "address" {
                        session.error(spec, Code::E102, format!("version {name} user has unknown key {key:?}"));
                        ok = false;
                    }
                }
            }
            Some(_) => {
                session.error(spec, Code::E054, format!("version {name} user is not a JSON object"));
                ok = false;
            }
        }
    }
    ok
}

impl Inventory {
    /// Check the typed inventory, recording findings in `session`.
    pub fn check(&self, session: &mut ValidationSession) {
        let spec = self.spec_version().unwrap_or_default();
        self.check_versions(spec, session);
        self.check_manifest(spec, session);
        self.check_states(spec, session);
        self.check_fixity(spec, session);
    }

    fn check_versions(&self, spec: SpecVersion, session: &mut ValidationSession) {
        if self.versions.is_empty() {
            session.error(spec, Code::E008, "inventory has no versions");
            return;
        }
        for (expected, v) in (1u32..).zip(self.versions.keys()) {
            if v.number() != expected {
                session.error(spec, Code::E009, format!("expected version v{expected}, found {v}"));
                break;
            }
        }

        let widths: HashSet<usize> = self.versions.keys().map(VersionNumber::width).collect();
        if widths.len() > 1 {
            session.error(spec, Code::E011, "version names mix zero-padded and unpadded forms or widths");
        } else if widths.iter().any(|w| *w > 0) {
            session.warning(spec, Code::W001, "version names are zero-padded");
        }

        if let Some(last) = self.versions.keys().next_back() {
            if *last != self.head {
                session.error(spec, Code::E040, format!("head is {} but the last version is {last}", self.head));
            }
        }

        for (v, version) in &self.versions {
            let Some(user) = &version.user else { continue };
            if user.name.is_empty() {
                session.error(spec, Code::E054, format!("version {v} user name is empty"));
            }
            match &user.address {
                None => session.warning(spec, Code::W008, format!("version {v} user has no address")),
                Some(address) if !looks_like_uri(address) => {
                    session.warning(spec, Code::W009, format!("version {v} user address {address:?} is not a URI"));
                }
                Some(_) => {}
            }
        }
    }

    fn check_manifest(&self, spec: SpecVersion, session: &mut ValidationSession) {
        check_digest_case(&self.manifest, "manifest", Code::E096, spec, session);

        let version_dirs: HashSet<String> = self.versions.keys().map(ToString::to_string).collect();
        let mut seen = HashSet::new();
        for (path, digest) in self.content_paths() {
            if !self.digest_algorithm.is_valid_digest(digest) {
                session.error(
                    spec,
                    Code::E096,
                    format!("manifest key {digest} is not a {} digest", self.digest_algorithm),
                );
            }
            if let Err(violation) = check_path(path) {
                let code = content_path_code(violation);
                session.error(spec, code, format!("content path {path:?}: {violation}"));
                continue;
            }
            if !seen.insert(path) {
                session.error(spec, Code::E101, format!("content path {path:?} appears more than once"));
            }
            let mut parts = path.splitn(3, '/');
            let in_version = parts.next().is_some_and(|v| version_dirs.contains(v));
            let in_content = parts.next() == Some(self.content_directory());
            if !in_version || !in_content {
                session.error(
                    spec,
                    Code::E042,
                    format!("content path {path:?} is not inside a version content directory"),
                );
            }
        }
        for (prefix, path) in find_conflicts(self.content_paths().map(|(p, _)| p)) {
            session.error(spec, Code::E101, format!("content path {prefix:?} is a prefix of {path:?}"));
        }

        let referenced: HashSet<&str> = self
            .versions
            .values()
            .flat_map(|v| v.state.keys().map(String::as_str))
            .collect();
        for digest in self.manifest.keys() {
            if !referenced.contains(digest.as_str()) {
                session.error(spec, Code::E107, format!("manifest digest {digest} is not used by any version"));
            }
        }
    }

    fn check_states(&self, spec: SpecVersion, session: &mut ValidationSession) {
        for (v, version) in &self.versions {
            let mut seen = HashSet::new();
            for (digest, paths) in &version.state {
                if !self.manifest.contains_key(digest) {
                    session.error(spec, Code::E050, format!("version {v} state digest {digest} is not in the manifest"));
                }
                for path in paths {
                    if let Err(violation) = check_path(path) {
                        let code = logical_path_code(violation);
                        session.error(spec, code, format!("version {v} logical path {path:?}: {violation}"));
                        continue;
                    }
                    if !seen.insert(path.as_str()) {
                        session.error(spec, Code::E095, format!("version {v} logical path {path:?} appears more than once"));
                    }
                }
            }
            let paths = version.state.values().flatten().map(String::as_str);
            for (prefix, path) in find_conflicts(paths) {
                session.error(
                    spec,
                    Code::E095,
                    format!("version {v} logical path {prefix:?} is a prefix of {path:?}"),
                );
            }
        }
    }

    fn check_fixity(&self, spec: SpecVersion, session: &mut ValidationSession) {
        let Some(fixity) = &self.fixity else { return };
        let content: HashSet<&str> = self.content_paths().map(|(p, _)| p).collect();
        for (name, block) in fixity {
            let algorithm = name.parse::<DigestAlgorithm>().ok();
            if algorithm.is_none() {
                session.error(spec, Code::E056, format!("fixity algorithm {name:?} is not known"));
            }
            check_digest_case(block, &format!("fixity {name}"), Code::E097, spec, session);
            for (digest, paths) in block {
                if let Some(alg) = algorithm {
                    if !alg.is_valid_digest(digest) {
                        session.error(spec, Code::E057, format!("fixity {name} key {digest} is not a {alg} digest"));
                    }
                }
                for path in paths {
                    if !content.contains(path.as_str()) {
                        session.error(spec, Code::E057, format!("fixity {name} path {path:?} is not in the manifest"));
                    }
                }
            }
        }
    }
}

/// Check a prior version's inventory against the current one.
///
/// Every version present in `prior` must describe the same state in
/// `current`. Differences in `created`, `message` or `user` are warnings.
pub fn compare_prior(
    current: &Inventory,
    prior: &Inventory,
    session: &mut ValidationSession,
) {
    let spec = current.spec_version().unwrap_or_default();
    let where_ = format!("inventory of {}", prior.head);

    if prior.id != current.id {
        session.error(spec, Code::E110, format!("{where_} has id {:?}, current is {:?}", prior.id, current.id));
    }
    if prior.content_directory() != current.content_directory() {
        session.error(
            spec,
            Code::E019,
            format!("{where_} has contentDirectory {:?}", prior.content_directory()),
        );
    }
    if let (Ok(prior_spec), Ok(current_spec)) = (prior.spec_version(), current.spec_version()) {
        if prior_spec > current_spec {
            session.error(
                spec,
                Code::E103,
                format!("{where_} declares {prior_spec}, later than current {current_spec}"),
            );
        }
    }

    let same_algorithm = prior.digest_algorithm == current.digest_algorithm;
    for (v, old) in &prior.versions {
        let Some(new) = current.versions.get(v) else {
            session.error(spec, Code::E066, format!("{where_} has version {v} missing from the current inventory"));
            continue;
        };
        let states_match = if same_algorithm {
            old.state == new.state
        } else {
            logical_sets(&old.state) == logical_sets(&new.state)
        };
        if !states_match {
            session.error(spec, Code::E066, format!("{where_} disagrees on the state of {v}"));
        }
        if old.created != new.created || old.message != new.message || old.user != new.user {
            session.warning(spec, Code::W011, format!("{where_} disagrees on the metadata of {v}"));
        }
    }
}

fn logical_sets(state: &DigestMap) -> HashSet<&str> {
    state.values().flatten().map(String::as_str).collect()
}

fn check_digest_case(
    map: &DigestMap,
    what: &str,
    code: Code,
    spec: SpecVersion,
    session: &mut ValidationSession,
) {
    let mut lower: HashMap<String, &str> = HashMap::new();
    for digest in map.keys() {
        if let Some(first) = lower.insert(digest.to_lowercase(), digest) {
            session.error(spec, code, format!("{what} has digest {digest} twice ({first})"));
        }
    }
}

fn content_path_code(violation: PathViolation) -> Code {
    match violation {
        PathViolation::BoundarySlash => Code::E100,
        PathViolation::Empty => Code::E098,
        PathViolation::EmptyElement | PathViolation::DotElement => Code::E099,
    }
}

fn logical_path_code(violation: PathViolation) -> Code {
    match violation {
        PathViolation::BoundarySlash => Code::E053,
        PathViolation::Empty => Code::E051,
        PathViolation::EmptyElement | PathViolation::DotElement => Code::E052,
    }
}

/// Loose URI test: a scheme followed by `:`.
pub fn looks_like_uri(s: &str) -> bool {
    let Some((scheme, rest)) = s.split_once(':') else {
        return false;
    };
    !rest.is_empty()
        && scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use ocfl_crypto::digest_bytes;
    use serde_json::json;

    use super::*;

    fn d(content: &str) -> String {
        digest_bytes(DigestAlgorithm::Sha512, content.as_bytes())
    }

    fn valid() -> Value {
        json!({
            "id": "urn:example:obj",
            "type": "https://ocfl.io/1.1/spec/#inventory",
            "digestAlgorithm": "sha512",
            "head": "v1",
            "manifest": { d("a"): ["v1/content/a.txt"] },
            "versions": {
                "v1": {
                    "created": "2024-01-01T00:00:00Z",
                    "message": "init",
                    "state": { d("a"): ["a.txt"] },
                    "user": { "name": "Jane", "address": "mailto:jane@example.org" }
                }
            }
        })
    }

    fn run(value: &Value) -> (Option<Inventory>, ValidationSession) {
        let mut session = ValidationSession::new();
        let bytes = serde_json::to_vec(value).unwrap();
        let inv = parse_checked(&bytes, SpecVersion::V1_1, &mut session);
        if let Some(inv) = &inv {
            inv.check(&mut session);
        }
        (inv, session)
    }

    #[test]
    fn valid_inventory_is_clean() {
        let (inv, session) = run(&valid());
        assert!(inv.is_some());
        assert!(session.is_empty(), "{session}");
    }

    #[test]
    fn missing_and_unknown_keys() {
        let mut v = valid();
        let obj = v.as_object_mut().unwrap();
        obj.remove("head");
        obj.remove("manifest");
        obj.insert("bogus".into(), json!(1));
        let (inv, session) = run(&v);
        assert!(inv.is_none());
        assert!(session.has(Code::E036));
        assert!(session.has(Code::E041));
        assert!(session.has(Code::E102));
    }

    #[test]
    fn bad_type_and_algorithm() {
        let mut v = valid();
        v["type"] = json!("https://example.org/inventory");
        v["digestAlgorithm"] = json!("md5");
        let (_, session) = run(&v);
        assert!(session.has(Code::E038));
        assert!(session.has(Code::E025));
    }

    #[test]
    fn sha256_is_a_warning() {
        let mut v = valid();
        let digest = digest_bytes(DigestAlgorithm::Sha256, b"a");
        v["digestAlgorithm"] = json!("sha256");
        v["manifest"] = json!({ &digest: ["v1/content/a.txt"] });
        v["versions"]["v1"]["state"] = json!({ &digest: ["a.txt"] });
        let (inv, session) = run(&v);
        assert!(inv.is_some());
        assert!(session.is_valid(), "{session}");
        assert!(session.has(Code::W004));
    }

    #[test]
    fn bad_version_names_and_dates() {
        let mut v = valid();
        let block = v["versions"]["v1"].clone();
        v["versions"] = json!({ "1": block });
        let (_, session) = run(&v);
        assert!(session.has(Code::E104));

        let mut v = valid();
        v["versions"]["v1"]["created"] = json!("yesterday");
        let (_, session) = run(&v);
        assert!(session.has(Code::E048));
    }

    #[test]
    fn version_gap_and_head_mismatch() {
        let mut v = valid();
        let block = v["versions"]["v1"].clone();
        v["versions"]["v3"] = block;
        let (_, session) = run(&v);
        assert!(session.has(Code::E009));
        assert!(session.has(Code::E040));
    }

    #[test]
    fn mixed_padding() {
        let mut v = valid();
        let block = v["versions"]["v1"].clone();
        v["versions"] = json!({ "v01": block.clone(), "v002": block });
        v["head"] = json!("v002");
        v["manifest"] = json!({ d("a"): ["v01/content/a.txt"] });
        let (_, session) = run(&v);
        assert!(session.has(Code::E011));
    }

    #[test]
    fn state_digest_not_in_manifest() {
        let mut v = valid();
        v["versions"]["v1"]["state"] = json!({ d("b"): ["a.txt"] });
        let (_, session) = run(&v);
        assert!(session.has(Code::E050));
        assert!(session.has(Code::E107));
    }

    #[test]
    fn path_rules() {
        let mut v = valid();
        v["manifest"] = json!({
            d("a"): ["v1/content/a.txt"],
            d("b"): ["v1/content/a.txt/b"],
        });
        v["versions"]["v1"]["state"] = json!({
            d("a"): ["dir"],
            d("b"): ["dir/b", "/abs"],
        });
        let (_, session) = run(&v);
        assert!(session.has(Code::E101));
        assert!(session.has(Code::E095));
        assert!(session.has(Code::E053));
    }

    #[test]
    fn content_path_outside_content_directory() {
        let mut v = valid();
        v["manifest"] = json!({ d("a"): ["v1/data/a.txt"] });
        let (_, session) = run(&v);
        assert!(session.has(Code::E042));
    }

    #[test]
    fn digest_case_duplicates() {
        let mut v = valid();
        let upper = d("a").to_uppercase();
        v["manifest"] = json!({ d("a"): ["v1/content/a.txt"], upper.clone(): ["v1/content/b.txt"] });
        v["versions"]["v1"]["state"] = json!({ d("a"): ["a.txt"], upper: ["b.txt"] });
        let (_, session) = run(&v);
        assert!(session.has(Code::E096));
    }

    #[test]
    fn fixity_checks() {
        let mut v = valid();
        v["fixity"] = json!({
            "md5": { "0cc175b9c0f1b6a831c399e269772661": ["v1/content/missing.txt"] },
            "crc99": {}
        });
        let (_, session) = run(&v);
        assert!(session.has(Code::E057));
        assert!(session.has(Code::E056));

        let mut v = valid();
        v["fixity"] = json!([]);
        let (_, session) = run(&v);
        assert!(session.has(Code::E111));
    }

    #[test]
    fn user_and_message_warnings() {
        let mut v = valid();
        let block = v["versions"]["v1"].as_object_mut().unwrap();
        block.remove("message");
        block.insert("user".into(), json!({ "name": "Jane", "address": "jane" }));
        let (_, session) = run(&v);
        assert!(session.has(Code::W007));
        assert!(session.has(Code::W009));
        assert!(session.is_valid());
    }

    #[test]
    fn id_should_be_uri() {
        let mut v = valid();
        v["id"] = json!("plain-id");
        let (_, session) = run(&v);
        assert!(session.has(Code::W005));
    }

    #[test]
    fn not_json() {
        let mut session = ValidationSession::new();
        assert!(parse_checked(b"{nope", SpecVersion::V1_1, &mut session).is_none());
        assert!(session.has(Code::E033));
    }

    #[test]
    fn prior_inventory_consistency() {
        let (current, _) = run(&valid());
        let current = current.unwrap();

        let mut changed = valid();
        changed["versions"]["v1"]["state"] = json!({ d("a"): ["renamed.txt"] });
        changed["versions"]["v1"]["message"] = json!("other");
        let (prior, _) = run(&changed);

        let mut session = ValidationSession::new();
        compare_prior(&current, &prior.unwrap(), &mut session);
        assert!(session.has(Code::E066));
        assert!(session.has(Code::W011));

        let mut session = ValidationSession::new();
        compare_prior(&current, &current, &mut session);
        assert!(session.is_empty());
    }

    #[test]
    fn uri_detection() {
        assert!(looks_like_uri("mailto:a@b.org"));
        assert!(looks_like_uri("https://orcid.org/0000"));
        assert!(looks_like_uri("ark:/12345/x"));
        assert!(!looks_like_uri("jane@example.org"));
        assert!(!looks_like_uri("1abc:x"));
    }
}
