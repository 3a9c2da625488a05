use std::error::Error;
use std::fmt;

type BoxedError = Box<dyn Error + Send + Sync + 'static>;

/// An append-only list of independent failures.
///
/// "No error" is the empty list. Lists from independent sub-operations are
/// merged with [`ErrorList::combine`]; callers that need a single `Result`
/// use [`ErrorList::into_result`].
#[derive(Debug, Default)]
pub struct ErrorList {
    errors: Vec<BoxedError>,
}

impl ErrorList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one error.
    pub fn push(&mut self, error: impl Into<BoxedError>) {
        self.errors.push(error.into());
    }

    /// Append every error of `other`, preserving order.
    pub fn combine(&mut self, other: ErrorList) {
        self.errors.extend(other.errors);
    }

    /// Record the error of a failed result and return its success value.
    pub fn collect<T, E: Into<BoxedError>>(&mut self, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.push(e);
                None
            }
        }
    }

    /// Returns `true` if no error has been recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of recorded errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate over the recorded errors.
    pub fn iter(&self) -> impl Iterator<Item = &(dyn Error + Send + Sync + 'static)> {
        self.errors.iter().map(|e| e.as_ref())
    }

    /// `Ok(value)` if the list is empty, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> Result<T, ErrorList> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.len() {
            0 => f.write_str("no errors"),
            1 => write!(f, "{}", self.errors[0]),
            n => {
                write!(f, "{n} errors: ")?;
                for (i, e) in self.errors.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{e}")?;
                }
                Ok(())
            }
        }
    }
}

impl Error for ErrorList {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.errors
            .first()
            .map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

impl From<BoxedError> for ErrorList {
    fn from(error: BoxedError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TypeError;

    #[test]
    fn empty_list_is_success() {
        let list = ErrorList::new();
        assert!(list.is_empty());
        assert_eq!(list.into_result(7).unwrap(), 7);
    }

    #[test]
    fn combine_preserves_order() {
        let mut a = ErrorList::new();
        a.push(TypeError::InvalidVersion("x".into()));
        let mut b = ErrorList::new();
        b.push(TypeError::UnknownDigestAlgorithm("crc".into()));
        b.push("plain message");
        a.combine(b);

        assert_eq!(a.len(), 3);
        let messages: Vec<String> = a.iter().map(|e| e.to_string()).collect();
        assert_eq!(messages[0], "invalid version directory name: x");
        assert_eq!(messages[2], "plain message");
    }

    #[test]
    fn collect_keeps_value_or_error() {
        let mut list = ErrorList::new();
        let ok: Result<u8, TypeError> = Ok(1);
        let err: Result<u8, TypeError> = Err(TypeError::InvalidVersion("v0".into()));
        assert_eq!(list.collect(ok), Some(1));
        assert_eq!(list.collect(err), None);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn display_joins_messages() {
        let mut list = ErrorList::new();
        list.push("first");
        list.push("second");
        assert_eq!(list.to_string(), "2 errors: first; second");
        assert!(list.into_result(()).is_err());
    }
}
