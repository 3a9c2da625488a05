use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::error::ExtensionResult;
use crate::extension::{Extension, Metadata, ObjectState};

pub const CONTENT_SUMMARY_NAME: &str = "NNNN-content-summary";

/// File and version counts for an object, with a per-extension breakdown
/// of the head version.
#[derive(Debug, Default)]
pub struct ContentSummary;

impl ContentSummary {
    pub fn from_config(_config: Value) -> ExtensionResult<Self> {
        Ok(Self)
    }
}

impl Extension for ContentSummary {
    fn name(&self) -> &str {
        CONTENT_SUMMARY_NAME
    }

    fn config(&self) -> Value {
        json!({ "extensionName": CONTENT_SUMMARY_NAME })
    }

    fn as_metadata(&self) -> Option<&dyn Metadata> {
        Some(self)
    }
}

impl Metadata for ContentSummary {
    fn object_metadata(&self, state: &ObjectState) -> ExtensionResult<Value> {
        let mut by_extension: BTreeMap<String, usize> = BTreeMap::new();
        for logical in state.files.keys() {
            let name = logical.rsplit('/').next().unwrap_or(logical);
            let ext = match name.rsplit_once('.') {
                Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
                _ => String::new(),
            };
            *by_extension.entry(ext).or_default() += 1;
        }
        Ok(json!({
            "files": state.files.len(),
            "versions": state.versions,
            "byExtension": by_extension,
        }))
    }
}
