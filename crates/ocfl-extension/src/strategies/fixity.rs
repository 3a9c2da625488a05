use ocfl_types::DigestAlgorithm;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ExtensionResult;
use crate::extension::{parse_algorithm, parse_config, Extension, FixityDigest};

pub const FIXITY_DIGESTS_NAME: &str = "NNNN-fixity-digests";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
struct FixityConfig {
    algorithms: Vec<String>,
}

/// Extra digests recorded in the inventory fixity block for every ingested
/// file.
#[derive(Debug)]
pub struct FixityDigests {
    algorithms: Vec<DigestAlgorithm>,
}

impl FixityDigests {
    pub fn from_config(config: Value) -> ExtensionResult<Self> {
        let config: FixityConfig = parse_config(FIXITY_DIGESTS_NAME, config)?;
        let mut algorithms = config
            .algorithms
            .iter()
            .map(|a| parse_algorithm(FIXITY_DIGESTS_NAME, a))
            .collect::<ExtensionResult<Vec<_>>>()?;
        algorithms.sort();
        algorithms.dedup();
        Ok(Self { algorithms })
    }
}

impl Extension for FixityDigests {
    fn name(&self) -> &str {
        FIXITY_DIGESTS_NAME
    }

    fn config(&self) -> Value {
        let names: Vec<&str> = self.algorithms.iter().map(DigestAlgorithm::name).collect();
        json!({
            "extensionName": FIXITY_DIGESTS_NAME,
            "algorithms": names,
        })
    }

    fn as_fixity_digest(&self) -> Option<&dyn FixityDigest> {
        Some(self)
    }
}

impl FixityDigest for FixityDigests {
    fn fixity_algorithms(&self) -> Vec<DigestAlgorithm> {
        self.algorithms.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_algorithm_list() {
        let ext = FixityDigests::from_config(json!({
            "extensionName": FIXITY_DIGESTS_NAME,
            "algorithms": ["sha1", "md5", "md5"],
        }))
        .unwrap();
        assert_eq!(ext.fixity_algorithms(), vec![DigestAlgorithm::Md5, DigestAlgorithm::Sha1]);
        assert_eq!(ext.config()["algorithms"], json!(["md5", "sha1"]));
    }

    #[test]
    fn unknown_algorithm_fails() {
        let result = FixityDigests::from_config(json!({
            "extensionName": FIXITY_DIGESTS_NAME,
            "algorithms": ["crc32"],
        }));
        assert!(result.is_err());
    }
}
