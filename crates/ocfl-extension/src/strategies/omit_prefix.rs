use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ExtensionError, ExtensionResult};
use crate::extension::{parse_config, Extension, StorageRootPath};

pub const FLAT_OMIT_PREFIX_NAME: &str = "0006-flat-omit-prefix-storage-layout";

#[derive(Clone, Debug, Deserialize)]
struct OmitPrefixConfig {
    delimiter: String,
}

/// The identifier with everything up to and including the last
/// `delimiter` removed, used as a top-level directory.
#[derive(Debug)]
pub struct FlatOmitPrefix {
    config: OmitPrefixConfig,
}

impl FlatOmitPrefix {
    pub fn from_config(config: Value) -> ExtensionResult<Self> {
        let config: OmitPrefixConfig = parse_config(FLAT_OMIT_PREFIX_NAME, config)?;
        if config.delimiter.is_empty() {
            return Err(ExtensionError::config(FLAT_OMIT_PREFIX_NAME, "delimiter must not be empty"));
        }
        Ok(Self { config })
    }
}

impl Extension for FlatOmitPrefix {
    fn name(&self) -> &str {
        FLAT_OMIT_PREFIX_NAME
    }

    fn config(&self) -> Value {
        json!({
            "extensionName": FLAT_OMIT_PREFIX_NAME,
            "delimiter": self.config.delimiter,
        })
    }

    fn as_storage_root_path(&self) -> Option<&dyn StorageRootPath> {
        Some(self)
    }
}

impl StorageRootPath for FlatOmitPrefix {
    fn build_storage_root_path(&self, id: &str) -> ExtensionResult<String> {
        let rest = match id.rfind(&self.config.delimiter) {
            Some(at) => &id[at + self.config.delimiter.len()..],
            None => id,
        };
        if rest.is_empty() || rest.contains('/') || rest == "." || rest == ".." {
            return Err(ExtensionError::InvalidIdentifier {
                name: FLAT_OMIT_PREFIX_NAME.into(),
                id: id.into(),
                reason: "nothing usable follows the last delimiter".into(),
            });
        }
        Ok(rest.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ext(delimiter: &str) -> FlatOmitPrefix {
        FlatOmitPrefix::from_config(json!({
            "extensionName": FLAT_OMIT_PREFIX_NAME,
            "delimiter": delimiter,
        }))
        .unwrap()
    }

    #[test]
    fn strips_through_last_delimiter() {
        assert_eq!(ext(":").build_storage_root_path("namespace:12887296").unwrap(), "12887296");
        assert_eq!(
            ext("edu/").build_storage_root_path("https://institution.edu/3448793").unwrap(),
            "3448793"
        );
        assert_eq!(ext(":").build_storage_root_path("plain").unwrap(), "plain");
    }

    #[test]
    fn empty_remainder_is_an_error() {
        assert!(ext(":").build_storage_root_path("namespace:").is_err());
    }

    #[test]
    fn delimiter_is_required() {
        assert!(FlatOmitPrefix::from_config(json!({ "extensionName": FLAT_OMIT_PREFIX_NAME })).is_err());
    }
}
