//! Path rules shared by logical paths (version state) and content paths
//! (manifest and fixity).
//!
//! Both kinds of path are `/`-separated, relative, and made of non-empty
//! elements that are neither `.` nor `..`. Within one path set no path may be
//! a directory prefix of another.

use std::collections::HashSet;
use std::fmt;

/// The first rule a path breaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathViolation {
    /// The path is the empty string.
    Empty,
    /// The path starts or ends with `/`.
    BoundarySlash,
    /// The path contains an empty element (`a//b`).
    EmptyElement,
    /// The path contains a `.` or `..` element.
    DotElement,
}

impl fmt::Display for PathViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Empty => "path is empty",
            Self::BoundarySlash => "path begins or ends with '/'",
            Self::EmptyElement => "path contains an empty element",
            Self::DotElement => "path contains a '.' or '..' element",
        };
        f.write_str(text)
    }
}

/// Check a single path against the element rules.
pub fn check_path(path: &str) -> Result<(), PathViolation> {
    if path.is_empty() {
        return Err(PathViolation::Empty);
    }
    if path.starts_with('/') || path.ends_with('/') {
        return Err(PathViolation::BoundarySlash);
    }
    for element in path.split('/') {
        if element.is_empty() {
            return Err(PathViolation::EmptyElement);
        }
        if element == "." || element == ".." {
            return Err(PathViolation::DotElement);
        }
    }
    Ok(())
}

/// Every directory prefix of `path` (`a/b/c` yields `a` and `a/b`).
pub fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices('/').map(move |(i, _)| &path[..i])
}

/// Find every pair `(prefix, path)` in which `prefix` is used both as a file
/// and as a directory of `path`.
///
/// Result pairs are sorted by `path`.
pub fn find_conflicts<'a, I>(paths: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = &'a str>,
{
    let all: Vec<&str> = paths.into_iter().collect();
    let set: HashSet<&str> = all.iter().copied().collect();
    let mut conflicts: Vec<(String, String)> = all
        .iter()
        .flat_map(|path| {
            ancestors(path)
                .filter(|a| set.contains(a))
                .map(|a| (a.to_string(), path.to_string()))
                .collect::<Vec<_>>()
        })
        .collect();
    conflicts.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
    conflicts.dedup();
    conflicts
}

/// Join path elements with `/`, skipping empty elements.
pub fn join(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_paths() {
        assert!(check_path("a.txt").is_ok());
        assert!(check_path("dir/sub/file").is_ok());
        assert!(check_path("...").is_ok());
    }

    #[test]
    fn invalid_paths() {
        assert_eq!(check_path(""), Err(PathViolation::Empty));
        assert_eq!(check_path("/abs"), Err(PathViolation::BoundarySlash));
        assert_eq!(check_path("dir/"), Err(PathViolation::BoundarySlash));
        assert_eq!(check_path("a//b"), Err(PathViolation::EmptyElement));
        assert_eq!(check_path("a/./b"), Err(PathViolation::DotElement));
        assert_eq!(check_path("../up"), Err(PathViolation::DotElement));
    }

    #[test]
    fn ancestors_of_nested_path() {
        let found: Vec<&str> = ancestors("a/b/c").collect();
        assert_eq!(found, vec!["a", "a/b"]);
        assert_eq!(ancestors("flat").count(), 0);
    }

    #[test]
    fn conflicts_detected() {
        let conflicts = find_conflicts(["a", "a/b", "c/d", "c/e"]);
        assert_eq!(conflicts, vec![("a".to_string(), "a/b".to_string())]);
    }

    #[test]
    fn similar_names_do_not_conflict() {
        assert!(find_conflicts(["ab", "a/b", "abc/d"]).is_empty());
    }

    #[test]
    fn join_skips_empty() {
        assert_eq!(join(&["v1", "", "content", "a.txt"]), "v1/content/a.txt");
    }
}
