//! Validation code catalogues.
//!
//! The 1.1 catalogue is the base: every code carries its 1.1 requirement
//! text, which 2.0 shares. The 1.0 catalogue covers the codes up to `E102`
//! plus the warnings, with its own wording where the 1.0 text differs.
//! Revisions that lack a code resolve it through a fallback table to the
//! code that expressed the same requirement at the time, or to the latest
//! catalogue when there is no older equivalent.

use ocfl_types::SpecVersion;
use serde::Serialize;

macro_rules! catalogue {
    ($($code:ident => $text:expr),* $(,)?) => {
        /// An OCFL validation code (`E001`...`E112`, `W001`...`W016`).
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub enum Code {
            $($code),*
        }

        impl Code {
            /// Every known code, errors first, in numeric order.
            pub const ALL: &'static [Code] = &[$(Code::$code),*];

            /// The code as printed (`E092`).
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Code::$code => stringify!($code)),*
                }
            }

            /// Requirement text from the 1.1 catalogue.
            pub fn description(self) -> &'static str {
                match self {
                    $(Code::$code => $text),*
                }
            }
        }
    };
}

catalogue! {
    E001 => "The OCFL Object Root must not contain files or directories other than those specified.",
    E002 => "The version declaration must be formatted according to the NAMASTE specification.",
    E003 => "There must be exactly one version declaration file in the base directory of the OCFL Object Root giving the OCFL version in the filename.",
    E004 => "The version declaration filename must conform to the pattern T=dvalue, where T must be 0.",
    E005 => "The version declaration filename must conform to the pattern T=dvalue, where dvalue must be ocfl_object_ followed by the specification version number.",
    E006 => "The version declaration filename must name a known OCFL specification version.",
    E007 => "The text contents of the version declaration file must be the same as dvalue, followed by a newline (\\n).",
    E008 => "OCFL Object content must be stored as a sequence of one or more versions.",
    E009 => "The version number sequence must start at 1 and must be continuous without missing integers.",
    E010 => "If zero-padded version directory numbers are used then they must start with the prefix v and then a zero.",
    E011 => "If zero-padded version directory numbers are used then all version directory names in an OCFL Object must have the same number of characters.",
    E012 => "The number of versions must not exceed the capacity of the zero-padded version directory names.",
    E013 => "Operations that add a new version to an object must follow the version directory naming convention established by earlier versions.",
    E014 => "References to files inside an object must be relative to the OCFL Object Root.",
    E015 => "Version directories must not contain files other than the inventory, its sidecar and the content directory.",
    E016 => "Version directories must contain a designated content sub-directory if the version contains files to be preserved.",
    E017 => "The contentDirectory value must not contain the forward slash (/) path separator.",
    E018 => "The contentDirectory value must not be either one or two periods (. or ..).",
    E019 => "If the key contentDirectory is set, it must be set in the first version of the object and must not change between versions of the same object.",
    E020 => "If the key contentDirectory is not present in the inventory file then the name of the designated content sub-directory must be content.",
    E021 => "The content directory name must be the same in every inventory of the object.",
    E022 => "A content directory must only be present in a version directory.",
    E023 => "Every file within a version's content directory must be referenced in the manifest section of the inventory.",
    E024 => "There must not be empty directories within a version's content directory.",
    E025 => "For content-addressing, OCFL Objects must use either sha512 or sha256, and should use sha512.",
    E026 => "For storage of additional fixity values, implementers must choose from the controlled vocabulary of digest algorithms.",
    E027 => "OCFL clients must support all fixity algorithms given in the specification table.",
    E028 => "Optional fixity algorithms that are not supported by a client must be ignored by that client.",
    E029 => "SHA-1 digests must be encoded using hex (base16) encoding.",
    E030 => "SHA-256 digests must be encoded using hex (base16) encoding.",
    E031 => "SHA-512 digests must be encoded using hex (base16) encoding.",
    E032 => "BLAKE2b-512 digests must be encoded using hex (base16) encoding.",
    E033 => "An OCFL Object Inventory must follow the JSON structure described in the specification and must be named inventory.json.",
    E034 => "An OCFL Object Inventory must be named inventory.json.",
    E035 => "The forward slash (/) path separator must be used in content paths in the manifest and fixity blocks within the inventory.",
    E036 => "Every OCFL inventory must include the following keys: id, type, digestAlgorithm, head.",
    E037 => "The id must be unique in the local context, and should be a URI.",
    E038 => "The type must be the URI of the inventory section of the specification version matching the object conformance declaration.",
    E039 => "The digestAlgorithm must be the algorithm used in the manifest and state blocks.",
    E040 => "The head must be the version directory name with the highest version number.",
    E041 => "In addition to these keys, there must be two other blocks present, manifest and versions.",
    E042 => "Content paths within a manifest block must be relative to the OCFL Object Root.",
    E043 => "An OCFL Object Inventory must include a block for storing versions.",
    E044 => "The versions block must have the key of versions within the inventory, and it must be a JSON object.",
    E045 => "The keys of the versions object must correspond to the names of the version directories used.",
    E046 => "Each value of the versions object must be another JSON object that characterizes the version.",
    E047 => "A JSON object to describe one OCFL Version must include the following keys: created, state.",
    E048 => "The value of the created key must be expressed in the Internet Date/Time Format defined by RFC3339.",
    E049 => "The keys of the state object are digest values, each of which must exactly match a digest value key in the manifest of the inventory.",
    E050 => "The keys of the state object are digest values, each of which must correspond to an entry in the manifest of the inventory.",
    E051 => "A logical path must be interpreted as a set of one or more path elements joined by a / path separator.",
    E052 => "Logical path elements must not be ., .., or empty (//).",
    E053 => "A logical path must not begin or end with a forward slash (/).",
    E054 => "The value of the user key must contain a user name key, name.",
    E055 => "If present, the fixity block must have the key of fixity within the inventory.",
    E056 => "The fixity block must contain keys corresponding to the controlled vocabulary of digest algorithms.",
    E057 => "The value of the fixity block for a particular digest algorithm must follow the structure of the manifest block.",
    E058 => "Every occurrence of an inventory file must have an accompanying sidecar file stating its digest.",
    E059 => "The sidecar algorithm must match the value given for the digestAlgorithm key in the inventory.",
    E060 => "The digest sidecar file must contain the digest of the inventory file.",
    E061 => "The digest sidecar file must follow the format: DIGEST inventory.json",
    E062 => "The digest of the inventory must be computed only after all changes to the inventory have been made.",
    E063 => "Every OCFL Object must have an inventory file within the OCFL Object Root, corresponding to the state of the object at the current version.",
    E064 => "Where an OCFL Object contains inventory.json in version directories, the inventory file in the OCFL Object Root must be the same as the file in the most recent version.",
    E066 => "Each version block in each prior inventory file must represent the same object state as the corresponding version block in the current inventory file.",
    E067 => "The extensions directory must not contain any files, and no sub-directories other than extension sub-directories.",
    E068 => "The specific structure and function of an extension must be defined in the extensions repository or in the Storage Root.",
    E069 => "An OCFL Storage Root must contain a Root Conformance Declaration identifying it as such.",
    E070 => "If present, the ocfl_layout.json document must include the keys extension and description.",
    E071 => "The value of the ocfl_layout.json extension key must be the registered extension name for the extension defining the arrangement under the storage root.",
    E072 => "The directory hierarchy used to store OCFL Objects must not contain files that are not part of an OCFL Object.",
    E073 => "Empty directories must not appear under a storage root.",
    E074 => "An OCFL Storage Root must not contain OCFL Objects within other OCFL Objects.",
    E075 => "The OCFL version declaration must be formatted according to the NAMASTE specification.",
    E076 => "There must be exactly one version declaration file in the base directory of the OCFL Storage Root giving the OCFL version in the filename.",
    E077 => "The storage root declaration filename must conform to the pattern T=dvalue, where T must be 0.",
    E078 => "The storage root declaration filename must conform to the pattern T=dvalue, where dvalue must be ocfl_ followed by the specification version number.",
    E079 => "The storage root declaration filename must name a known OCFL specification version.",
    E080 => "The text contents of the storage root version declaration file must be the same as dvalue, followed by a newline (\\n).",
    E081 => "OCFL Objects within the OCFL Storage Root must indicate conformance to the same or earlier version of the specification.",
    E082 => "OCFL Object Roots must be stored either as the terminal resource at the end of a directory storage hierarchy or as direct children of a containing OCFL Storage Root.",
    E083 => "There must be a deterministic mapping from an object identifier to a unique storage path.",
    E084 => "Storage hierarchies must not include files within intermediate directories.",
    E085 => "Storage hierarchies must be terminated by OCFL Object Roots.",
    E086 => "The storage root extensions directory must conform to the same guidelines and limitations as those defined for object extensions.",
    E087 => "An OCFL validator must ignore any files in the storage root it does not understand.",
    E088 => "An OCFL Storage Root must not contain directories or sub-directories other than as a directory hierarchy used to store OCFL Objects or for storage root extensions.",
    E089 => "Non-OCFL-compliant features must be wrapped in a suitable disk or filesystem image format.",
    E090 => "Hard and soft (symbolic) links must not be used within OCFL Storage hierarchies.",
    E091 => "Filesystems must preserve the case of OCFL filepaths and filenames.",
    E092 => "The value for each key in the manifest must be an array containing the content paths of files in the OCFL Object that have content with the given digest.",
    E093 => "The value for each key in the fixity block must be an array containing the content paths of files in the OCFL Object that have content with the given digest.",
    E094 => "The value of the message key is freeform text and must be a JSON string.",
    E095 => "Within a version, logical paths must be unique and non-conflicting, so the logical path for a file cannot appear as the initial part of another logical path.",
    E096 => "Each digest value must occur only once in the manifest regardless of case.",
    E097 => "Each digest value must occur only once in the fixity block for any digest algorithm, regardless of case.",
    E098 => "A content path must be interpreted as a set of one or more path elements joined by a / path separator.",
    E099 => "Content path elements must not be ., .., or empty (//).",
    E100 => "A content path must not begin or end with a forward slash (/).",
    E101 => "Within an inventory, content paths must be unique and non-conflicting, so the content path for a file cannot appear as the initial part of another content path.",
    E102 => "An inventory file must not contain keys that are not specified.",
    E103 => "Each version directory within an OCFL Object must conform to either the same or a later OCFL specification version as the preceding version directory.",
    E104 => "Version directory names must be constructed by prepending v to the version number.",
    E105 => "The version number must be taken from the sequence of positive, base-ten integers: 1, 2, 3, etc.",
    E106 => "The value of the manifest key must be a JSON object.",
    E107 => "Each manifest key must correspond to a digest value key found in one or more state blocks of the current or previous versions of the object.",
    E108 => "The contentDirectory value must represent a direct child directory of the version directory in which it is found.",
    E110 => "A unique identifier for the OCFL Object must not change between versions of the same object.",
    E111 => "If present, the value of the fixity key must be a JSON object, which may be empty.",
    E112 => "The extensions directory must not contain any files or sub-directories other than extension sub-directories.",
    W001 => "Implementations should use version directory names constructed without zero-padding the version number.",
    W002 => "The version directory should not contain any directories other than the designated content sub-directory.",
    W003 => "Version directories should not contain a content sub-directory if the version contains no files.",
    W004 => "For content-addressing, OCFL Objects should use sha512.",
    W005 => "The OCFL Object Inventory id should be a URI.",
    W007 => "The JSON object describing an OCFL Version should include the message and user keys.",
    W008 => "The value of the user key should contain an address key, address.",
    W009 => "The address value should be a URI: either a mailto URI or a URL to a personal identifier.",
    W010 => "Every version directory should include an inventory file that is an inventory of all content for versions up to and including that particular version.",
    W011 => "Version blocks in prior inventories should carry the same created, message and user values as the current inventory.",
    W012 => "Implementers should use the logs directory, if present, for storing files that contain a record of actions taken on the object.",
    W013 => "In an OCFL Object, extension sub-directories should be named according to a registered extension name.",
    W014 => "Storage hierarchies within the same OCFL Storage Root should use just one layout pattern.",
    W015 => "Storage hierarchies within the same OCFL Storage Root should consistently use either a directory hierarchy of OCFL Objects or top-level OCFL Objects.",
    W016 => "In the Storage Root, extension sub-directories should be named according to a registered extension name.",
}

impl Code {
    /// Returns `true` for `W` codes.
    pub fn is_warning(self) -> bool {
        self.as_str().starts_with('W')
    }

    /// Returns `true` if the catalogue of `spec` defines this code.
    pub fn defined_in(self, spec: SpecVersion) -> bool {
        match spec {
            SpecVersion::V1_0 => self.is_warning() || self < Code::E103,
            SpecVersion::V1_1 | SpecVersion::V2_0 => true,
        }
    }

    /// Requirement text as worded in the catalogue of `spec`.
    pub fn description_in(self, spec: SpecVersion) -> &'static str {
        match spec {
            SpecVersion::V1_0 => v1_0_text(self).unwrap_or_else(|| self.description()),
            SpecVersion::V1_1 | SpecVersion::V2_0 => self.description(),
        }
    }

    /// Link to the requirement in the specification text of `spec`.
    pub fn reference(self, spec: SpecVersion) -> String {
        format!("{}#{}", spec.spec_url(), self.as_str())
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 1.0 wording, for the codes whose text changed in 1.1.
fn v1_0_text(code: Code) -> Option<&'static str> {
    let text = match code {
        Code::E009 => "Version directory names must be constructed by prepending v to the version number, and the sequence must start at 1 and be continuous without missing integers.",
        Code::E011 => "If zero-padded version directory numbers are used then all version directory names in an OCFL Object must have the same number of characters, and the sequence must start at 1.",
        Code::E017 => "The contentDirectory value must not contain the forward slash (/) path separator and must represent a direct child directory of the version directory.",
        Code::E018 => "The contentDirectory value must not be either one or two periods (. or ..).",
        Code::E025 => "For content-addressing, OCFL Objects must use either sha512 or sha256.",
        Code::E037 => "The id must be unique in the local context, must not change between versions, and should be a URI.",
        Code::E038 => "The type must be the URI of the inventory section of the specification, https://ocfl.io/1.0/spec/#inventory.",
        Code::E041 => "In addition to these keys, there must be two other blocks present, manifest and versions, and the manifest must be a JSON object.",
        Code::E050 => "The keys of the state object are digest values, each of which must correspond to an entry in the manifest, and every manifest entry must be referenced by some state.",
        Code::E056 => "The fixity block must be a JSON object whose keys correspond to the controlled vocabulary of digest algorithms.",
        Code::E067 => "The extensions directory must not contain any files or sub-directories other than extension sub-directories.",
        Code::E070 => "If present, ocfl_layout.json must be a JSON document that includes the keys extension and description.",
        _ => return None,
    };
    Some(text)
}

/// 1.0 equivalents for codes introduced in 1.1.
///
/// `None` means 1.0 had no equivalent; the latest catalogue entry is used.
fn v1_0_equivalent(code: Code) -> Option<Code> {
    match code {
        Code::E104 => Some(Code::E009),
        Code::E105 => Some(Code::E011),
        Code::E106 => Some(Code::E041),
        Code::E107 => Some(Code::E050),
        Code::E108 => Some(Code::E017),
        Code::E110 => Some(Code::E037),
        Code::E111 => Some(Code::E056),
        Code::E112 => Some(Code::E067),
        _ => None,
    }
}

/// A code resolved against the catalogue of one specification revision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolved {
    /// Code as it is named in the revision it was resolved against.
    pub code: Code,
    /// Revision whose catalogue supplied the entry.
    pub spec: SpecVersion,
    pub description: &'static str,
    pub reference: String,
}

/// Look `code` up in the catalogue of `spec`, following the fallback table
/// when that revision does not define it.
pub fn resolve(spec: SpecVersion, code: Code) -> Resolved {
    if code.defined_in(spec) {
        return Resolved {
            code,
            spec,
            description: code.description_in(spec),
            reference: code.reference(spec),
        };
    }
    let (code, spec) = match (spec, v1_0_equivalent(code)) {
        (SpecVersion::V1_0, Some(older)) => (older, SpecVersion::V1_0),
        _ => (code, SpecVersion::latest()),
    };
    Resolved {
        code,
        spec,
        description: code.description_in(spec),
        reference: code.reference(spec),
    }
}
