//! `ocfl.toml`: defaults for new roots, objects and versions.

use std::path::Path;

use anyhow::Context;
use ocfl_object::{ObjectConfig, StorageRootConfig};
use ocfl_types::{DigestAlgorithm, SpecVersion};
use serde::Deserialize;
use serde_json::{json, Value};

pub const DEFAULT_CONFIG_FILE: &str = "ocfl.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub spec_version: Option<SpecVersion>,
    pub digest_algorithm: Option<DigestAlgorithm>,
    pub fixity: Vec<DigestAlgorithm>,
    pub content_directory: Option<String>,
    pub user: UserConfig,
    /// Layout extension configuration for `init`.
    pub layout: Option<Value>,
    /// Extension configurations for new objects.
    pub object_extensions: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UserConfig {
    pub name: String,
    pub address: String,
}

impl CliConfig {
    /// Read `path`, or `ocfl.toml` in the working directory. A missing file
    /// gives the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no configuration file");
                return Ok(Self::default());
            }
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        Self::parse(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn object_config(&self) -> ObjectConfig {
        let defaults = ObjectConfig::default();
        ObjectConfig {
            spec_version: self.spec_version.unwrap_or(defaults.spec_version),
            digest_algorithm: self.digest_algorithm.unwrap_or(defaults.digest_algorithm),
            fixity: self.fixity.clone(),
            content_directory: self.content_directory.clone(),
            extensions: self.object_extensions.clone().unwrap_or(defaults.extensions),
        }
    }

    /// Root configuration; `layout` names an extension to use with its
    /// default settings, overriding the configured layout.
    pub fn root_config(&self, layout: Option<&str>, description: Option<String>) -> StorageRootConfig {
        let defaults = StorageRootConfig::default();
        let layout = match layout {
            Some(name) => json!({ "extensionName": name }),
            None => self.layout.clone().unwrap_or(defaults.layout),
        };
        StorageRootConfig {
            spec_version: self.spec_version.unwrap_or(defaults.spec_version),
            layout,
            description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = CliConfig::parse("").unwrap();
        let object = config.object_config();
        assert_eq!(object.digest_algorithm, DigestAlgorithm::Sha512);
        assert!(object.fixity.is_empty());
        assert_eq!(object.extensions, ObjectConfig::default().extensions);
        assert_eq!(config.root_config(None, None).layout, StorageRootConfig::default().layout);
    }

    #[test]
    fn full_file() {
        let config = CliConfig::parse(
            r#"
spec_version = "1.0"
digest_algorithm = "sha256"
fixity = ["md5", "sha1"]
content_directory = "data"

[user]
name = "Ann"
address = "mailto:ann@example.org"

[layout]
extensionName = "0004-hashed-n-tuple-storage-layout"
tupleSize = 2
numberOfTuples = 2

[[object_extensions]]
extensionName = "NNNN-content-filter"
exclude = ['\.tmp$']
"#,
        )
        .unwrap();
        assert_eq!(config.user.name, "Ann");

        let object = config.object_config();
        assert_eq!(object.spec_version, SpecVersion::V1_0);
        assert_eq!(object.digest_algorithm, DigestAlgorithm::Sha256);
        assert_eq!(object.fixity, vec![DigestAlgorithm::Md5, DigestAlgorithm::Sha1]);
        assert_eq!(object.content_directory.as_deref(), Some("data"));
        assert_eq!(object.extensions[0]["extensionName"], "NNNN-content-filter");

        let root = config.root_config(None, Some("mine".into()));
        assert_eq!(root.layout["tupleSize"], 2);
        assert_eq!(root.description.as_deref(), Some("mine"));
        let root = config.root_config(Some("0002-flat-direct-storage-layout"), None);
        assert_eq!(root.layout, json!({ "extensionName": "0002-flat-direct-storage-layout" }));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(CliConfig::parse("colour = true").is_err());
        assert!(CliConfig::parse("digest_algorithm = \"crc32\"").is_err());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert!(config.user.name.is_empty());
    }
}
