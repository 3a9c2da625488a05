use regex::RegexSet;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{ExtensionError, ExtensionResult};
use crate::extension::{parse_config, ContentChange, Extension};

pub const CONTENT_FILTER_NAME: &str = "NNNN-content-filter";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
struct FilterConfig {
    exclude: Vec<String>,
}

/// Refuses additions and updates of logical paths matching any `exclude`
/// pattern.
#[derive(Debug)]
pub struct ContentFilter {
    config: FilterConfig,
    exclude: RegexSet,
}

impl ContentFilter {
    pub fn from_config(config: Value) -> ExtensionResult<Self> {
        let config: FilterConfig = parse_config(CONTENT_FILTER_NAME, config)?;
        let exclude = RegexSet::new(&config.exclude)
            .map_err(|e| ExtensionError::config(CONTENT_FILTER_NAME, e.to_string()))?;
        Ok(Self { config, exclude })
    }

    fn check(&self, logical: &str) -> ExtensionResult<()> {
        let matched: Vec<&str> = self
            .exclude
            .matches(logical)
            .into_iter()
            .map(|i| self.config.exclude[i].as_str())
            .collect();
        match matched.first() {
            None => Ok(()),
            Some(pattern) => {
                info!(logical, pattern, "content filter rejected path");
                Err(ExtensionError::Rejected {
                    name: CONTENT_FILTER_NAME.into(),
                    path: logical.into(),
                    reason: format!("matches {pattern:?}"),
                })
            }
        }
    }
}

impl Extension for ContentFilter {
    fn name(&self) -> &str {
        CONTENT_FILTER_NAME
    }

    fn config(&self) -> Value {
        json!({
            "extensionName": CONTENT_FILTER_NAME,
            "exclude": self.config.exclude,
        })
    }

    fn as_content_change(&self) -> Option<&dyn ContentChange> {
        Some(self)
    }
}

impl ContentChange for ContentFilter {
    fn before_add(&self, logical: &str) -> ExtensionResult<()> {
        self.check(logical)
    }

    fn after_add(&self, logical: &str, digest: &str) -> ExtensionResult<()> {
        debug!(logical, digest, "content added");
        Ok(())
    }

    fn before_update(&self, logical: &str) -> ExtensionResult<()> {
        self.check(logical)
    }

    fn after_update(&self, logical: &str, digest: &str) -> ExtensionResult<()> {
        debug!(logical, digest, "content updated");
        Ok(())
    }

    fn after_delete(&self, logical: &str) -> ExtensionResult<()> {
        debug!(logical, "content deleted");
        Ok(())
    }
}
