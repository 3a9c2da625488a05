//! NAMASTE conformance declarations.
//!
//! A declaration is a file named `0=<dvalue>` whose content is `<dvalue>`
//! followed by a newline. Objects declare `ocfl_object_<version>`, storage
//! roots `ocfl_<version>`.

use ocfl_store::{DirEntry, FileSystem, FsResult};
use ocfl_types::SpecVersion;
use ocfl_validation::{Code, ValidationSession};

const TAG: &str = "0=";

/// What a declaration declares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Declaration {
    Object,
    Root,
}

impl Declaration {
    fn prefix(self) -> &'static str {
        match self {
            Self::Object => "ocfl_object_",
            Self::Root => "ocfl_",
        }
    }

    /// The `dvalue` for `spec`.
    pub fn dvalue(self, spec: SpecVersion) -> String {
        match self {
            Self::Object => spec.object_declaration(),
            Self::Root => spec.root_declaration(),
        }
    }

    /// Declaration file name for `spec`.
    pub fn file_name(self, spec: SpecVersion) -> String {
        format!("{TAG}{}", self.dvalue(spec))
    }

    /// Declaration file content for `spec`.
    pub fn content(self, spec: SpecVersion) -> String {
        format!("{}\n", self.dvalue(spec))
    }

    /// The revision named by a declaration file name, if it is one of ours.
    pub fn parse(self, file_name: &str) -> Option<SpecVersion> {
        file_name
            .strip_prefix(TAG)?
            .strip_prefix(self.prefix())?
            .parse()
            .ok()
    }

    /// Write the declaration file into the scope root.
    pub fn write(self, fs: &dyn FileSystem, spec: SpecVersion) -> FsResult<()> {
        fs.write_all(&self.file_name(spec), self.content(spec).as_bytes())
    }

    /// The revision declared in the scope root, if exactly one valid
    /// declaration is present.
    pub fn read(self, fs: &dyn FileSystem) -> FsResult<Option<SpecVersion>> {
        let entries = fs.read_dir("")?;
        let mut found = declarations(&entries).filter_map(|name| self.parse(name));
        match (found.next(), found.next()) {
            (Some(spec), None) => Ok(Some(spec)),
            _ => Ok(None),
        }
    }

    /// Check the declaration among `entries` of the scope root, recording
    /// findings against `fallback` when no revision can be read.
    pub fn check(
        self,
        fs: &dyn FileSystem,
        entries: &[DirEntry],
        fallback: SpecVersion,
        session: &mut ValidationSession,
    ) -> FsResult<Option<SpecVersion>> {
        let (missing, several, unknown, content_code) = match self {
            Self::Object => (Code::E003, Code::E003, Code::E006, Code::E007),
            Self::Root => (Code::E069, Code::E076, Code::E079, Code::E080),
        };
        let names: Vec<&str> = declarations(entries).collect();
        let name = match names.as_slice() {
            [] => {
                session.error(fallback, missing, "no conformance declaration");
                return Ok(None);
            }
            [name] => *name,
            many => {
                session.error(fallback, several, format!("{} conformance declarations: {}", many.len(), many.join(", ")));
                return Ok(None);
            }
        };
        let Some(spec) = self.parse(name) else {
            session.error(fallback, unknown, format!("declaration {name} names no known {} revision", self.prefix()));
            return Ok(None);
        };
        let content = fs.read_all(name)?;
        if content != self.content(spec).as_bytes() {
            session.error(
                spec,
                content_code,
                format!("{name} contains {:?}", String::from_utf8_lossy(&content)),
            );
        }
        Ok(Some(spec))
    }
}

/// File entries that look like NAMASTE declarations.
fn declarations(entries: &[DirEntry]) -> impl Iterator<Item = &str> {
    entries
        .iter()
        .filter(|e| !e.is_dir && e.name.starts_with(TAG))
        .map(|e| e.name.as_str())
}

/// Returns `true` if `name` is a NAMASTE declaration file name.
pub fn is_declaration(name: &str) -> bool {
    name.starts_with(TAG)
}
