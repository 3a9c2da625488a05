//! Identity and cleaned identity layouts.

use regex::{Captures, Regex};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ExtensionError, ExtensionResult};
use crate::extension::{parse_config, Extension, ObjectContentPath, StorageRootPath};

pub const DIRECT_NAME: &str = "NNNN-direct-path-layout";
pub const DIRECT_CLEAN_NAME: &str = "NNNN-direct-clean-path-layout";
pub const FLAT_DIRECT_NAME: &str = "0002-flat-direct-storage-layout";

// ---------------------------------------------------------------------------
// Direct
// ---------------------------------------------------------------------------

/// Identity mapping for identifiers and logical paths.
#[derive(Debug, Default)]
pub struct Direct;

impl Direct {
    pub fn from_config(_config: Value) -> ExtensionResult<Self> {
        Ok(Self)
    }
}

impl Extension for Direct {
    fn name(&self) -> &str {
        DIRECT_NAME
    }

    fn config(&self) -> Value {
        json!({ "extensionName": DIRECT_NAME })
    }

    fn as_storage_root_path(&self) -> Option<&dyn StorageRootPath> {
        Some(self)
    }

    fn as_object_content_path(&self) -> Option<&dyn ObjectContentPath> {
        Some(self)
    }
}

impl StorageRootPath for Direct {
    fn build_storage_root_path(&self, id: &str) -> ExtensionResult<String> {
        if id.is_empty() {
            return Err(ExtensionError::InvalidIdentifier {
                name: DIRECT_NAME.into(),
                id: id.into(),
                reason: "identifier is empty".into(),
            });
        }
        Ok(id.to_string())
    }
}

impl ObjectContentPath for Direct {
    fn build_object_content_path(&self, logical: &str) -> ExtensionResult<String> {
        Ok(logical.to_string())
    }
}

// ---------------------------------------------------------------------------
// Flat direct (0002)
// ---------------------------------------------------------------------------

/// Each identifier is used unchanged as a top-level directory name.
#[derive(Debug, Default)]
pub struct FlatDirect;

impl FlatDirect {
    pub fn from_config(_config: Value) -> ExtensionResult<Self> {
        Ok(Self)
    }
}

impl Extension for FlatDirect {
    fn name(&self) -> &str {
        FLAT_DIRECT_NAME
    }

    fn config(&self) -> Value {
        json!({ "extensionName": FLAT_DIRECT_NAME })
    }

    fn as_storage_root_path(&self) -> Option<&dyn StorageRootPath> {
        Some(self)
    }
}

impl StorageRootPath for FlatDirect {
    fn build_storage_root_path(&self, id: &str) -> ExtensionResult<String> {
        if id.is_empty() || id == "." || id == ".." || id.contains('/') {
            return Err(ExtensionError::InvalidIdentifier {
                name: FLAT_DIRECT_NAME.into(),
                id: id.into(),
                reason: "identifier is not a single directory name".into(),
            });
        }
        Ok(id.to_string())
    }
}

// ---------------------------------------------------------------------------
// Direct clean
// ---------------------------------------------------------------------------

/// Characters that are never allowed in a path element: controls, DEL, and
/// shell or markup specials.
const FORBIDDEN: &str = r#"[\x00-\x1F\x7F*?:\[\]"<>|(){}&'!\\;#@]"#;
const WHITESPACE: &str = r"[\s\x{FEFF}]";

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DirectCleanConfig {
    max_pathname_len: usize,
    max_filename_len: usize,
    whitespace_replacement_string: String,
    replacement_string: String,
    utf_encode: bool,
}

impl Default for DirectCleanConfig {
    fn default() -> Self {
        Self {
            max_pathname_len: 32000,
            max_filename_len: 127,
            whitespace_replacement_string: " ".into(),
            replacement_string: "_".into(),
            utf_encode: false,
        }
    }
}

/// Identity mapping with unsafe characters removed or escaped.
///
/// Each `/`-separated element is cleaned on its own: forbidden characters
/// and whitespace are replaced (or, with `utfEncode`, written as `=uXXXX`),
/// leading `-`, `~` and whitespace and trailing whitespace are removed, and
/// an element made only of periods has its first period replaced. Elements
/// and the whole path must fit the configured byte limits.
#[derive(Debug)]
pub struct DirectClean {
    config: DirectCleanConfig,
    forbidden: Regex,
    whitespace: Regex,
    leading: Regex,
    trailing: Regex,
    escaped_marker: Regex,
}

impl DirectClean {
    pub fn from_config(config: Value) -> ExtensionResult<Self> {
        let config: DirectCleanConfig = parse_config(DIRECT_CLEAN_NAME, config)?;
        if config.max_filename_len == 0 || config.max_pathname_len == 0 {
            return Err(ExtensionError::config(DIRECT_CLEAN_NAME, "length limits must be positive"));
        }
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| ExtensionError::config(DIRECT_CLEAN_NAME, e.to_string()))
        };
        Ok(Self {
            forbidden: compile(FORBIDDEN)?,
            whitespace: compile(WHITESPACE)?,
            leading: compile(r"^[-~\s\x{FEFF}]+")?,
            trailing: compile(r"[\s\x{FEFF}]+$")?,
            escaped_marker: compile(r"=(u[0-9A-Fa-f]{4})")?,
            config,
        })
    }

    /// Clean a whole `/`-separated path.
    pub fn clean(&self, path: &str) -> ExtensionResult<String> {
        let elements = path
            .split('/')
            .filter(|e| !e.is_empty())
            .map(|e| self.clean_element(e))
            .collect::<ExtensionResult<Vec<_>>>()?;
        let result = elements.join("/");
        if result.len() > self.config.max_pathname_len {
            return Err(ExtensionError::PathnameTooLong {
                len: result.len(),
                max: self.config.max_pathname_len,
            });
        }
        Ok(result)
    }

    fn clean_element(&self, element: &str) -> ExtensionResult<String> {
        let cleaned = if self.config.utf_encode {
            self.encode_element(element)
        } else {
            self.substitute_element(element)
        };
        if cleaned.len() > self.config.max_filename_len {
            return Err(ExtensionError::FilenameTooLong {
                len: cleaned.len(),
                max: self.config.max_filename_len,
                element: cleaned,
            });
        }
        Ok(cleaned)
    }

    fn substitute_element(&self, element: &str) -> String {
        let replaced = self
            .forbidden
            .replace_all(element, self.config.replacement_string.as_str());
        let replaced = self
            .whitespace
            .replace_all(&replaced, self.config.whitespace_replacement_string.as_str());
        let trimmed = self.leading.replace(&replaced, "");
        let mut out = self.trailing.replace(&trimmed, "").into_owned();

        if out.is_empty() {
            out = self.config.replacement_string.clone();
        } else if out.chars().all(|c| c == '.') {
            out.replace_range(0..1, &self.config.replacement_string);
        }
        out
    }

    fn encode_element(&self, element: &str) -> String {
        let encode = |caps: &Captures| {
            caps[0]
                .chars()
                .map(|c| format!("=u{:04X}", c as u32))
                .collect::<String>()
        };
        let marked = self.escaped_marker.replace_all(element, "=u003D$1");
        let out = self.forbidden.replace_all(&marked, encode);
        let out = self.whitespace.replace_all(&out, encode);
        let mut out = self.leading.replace(&out, encode).into_owned();

        if out.chars().all(|c| c == '.') {
            out.replace_range(0..1, "=u002E");
        }
        out
    }
}

impl Extension for DirectClean {
    fn name(&self) -> &str {
        DIRECT_CLEAN_NAME
    }

    fn config(&self) -> Value {
        json!({
            "extensionName": DIRECT_CLEAN_NAME,
            "maxPathnameLen": self.config.max_pathname_len,
            "maxFilenameLen": self.config.max_filename_len,
            "whitespaceReplacementString": self.config.whitespace_replacement_string,
            "replacementString": self.config.replacement_string,
            "utfEncode": self.config.utf_encode,
        })
    }

    fn as_storage_root_path(&self) -> Option<&dyn StorageRootPath> {
        Some(self)
    }

    fn as_object_content_path(&self) -> Option<&dyn ObjectContentPath> {
        Some(self)
    }
}

impl StorageRootPath for DirectClean {
    fn build_storage_root_path(&self, id: &str) -> ExtensionResult<String> {
        self.clean(id)
    }
}

impl ObjectContentPath for DirectClean {
    fn build_object_content_path(&self, logical: &str) -> ExtensionResult<String> {
        self.clean(logical)
    }
}
