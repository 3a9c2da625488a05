use ocfl_types::DigestAlgorithm;

use crate::error::{CryptoError, CryptoResult};

/// File name of an OCFL inventory.
pub const INVENTORY_FILE: &str = "inventory.json";

/// Name of the digest sidecar for `algorithm` (`inventory.json.sha512`).
pub fn sidecar_name(algorithm: DigestAlgorithm) -> String {
    format!("{INVENTORY_FILE}.{algorithm}")
}

/// Sidecar file content: `<digest> inventory.json` plus a newline.
pub fn format_sidecar(digest: &str) -> String {
    format!("{} {INVENTORY_FILE}\n", digest.to_lowercase())
}

/// Parse sidecar content and return the digest it states.
///
/// Accepts a single line `DIGEST inventory.json` with an optional trailing
/// newline. The digest is returned in lower case.
pub fn parse_sidecar(content: &str) -> CryptoResult<String> {
    let line = content.strip_suffix('\n').unwrap_or(content);
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.contains('\n') {
        return Err(CryptoError::MalformedSidecar("more than one line".into()));
    }

    let mut parts = line.split_whitespace();
    let (digest, file) = match (parts.next(), parts.next(), parts.next()) {
        (Some(digest), Some(file), None) => (digest, file),
        _ => {
            return Err(CryptoError::MalformedSidecar(format!(
                "expected 'DIGEST {INVENTORY_FILE}', got {line:?}"
            )))
        }
    };
    if file != INVENTORY_FILE {
        return Err(CryptoError::MalformedSidecar(format!(
            "names {file:?} instead of {INVENTORY_FILE}"
        )));
    }
    if digest.is_empty() || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CryptoError::MalformedSidecar(format!("digest {digest:?} is not hex")));
    }
    Ok(digest.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidecar_name_uses_algorithm() {
        assert_eq!(sidecar_name(DigestAlgorithm::Sha512), "inventory.json.sha512");
        assert_eq!(
            sidecar_name(DigestAlgorithm::Blake2b256),
            "inventory.json.blake2b-256"
        );
    }

    #[test]
    fn format_then_parse() {
        let content = format_sidecar("ABCDEF0123");
        assert_eq!(content, "abcdef0123 inventory.json\n");
        assert_eq!(parse_sidecar(&content).unwrap(), "abcdef0123");
    }

    #[test]
    fn parse_without_newline_and_with_tab() {
        assert_eq!(parse_sidecar("00ff\tinventory.json").unwrap(), "00ff");
    }

    #[test]
    fn reject_malformed() {
        assert!(parse_sidecar("").is_err());
        assert!(parse_sidecar("abcd").is_err());
        assert!(parse_sidecar("abcd inventory.jsonx\n").is_err());
        assert!(parse_sidecar("xyz inventory.json\n").is_err());
        assert!(parse_sidecar("abcd inventory.json extra\n").is_err());
        assert!(parse_sidecar("abcd inventory.json\nabcd inventory.json\n").is_err());
    }
}
