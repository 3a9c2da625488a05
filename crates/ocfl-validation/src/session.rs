use std::collections::HashSet;
use std::fmt;

use ocfl_types::SpecVersion;
use serde::Serialize;
use tracing::debug;

use crate::catalog::{resolve, Code};

/// Whether a finding breaks a MUST or a SHOULD requirement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warning => f.write_str("warning"),
        }
    }
}

/// One recorded finding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationEntry {
    pub code: Code,
    pub severity: Severity,
    /// Specification revision whose catalogue supplied the description.
    pub spec: SpecVersion,
    pub description: &'static str,
    pub reference: String,
    /// What was found, and where.
    pub context: String,
    /// Object being validated when the finding was recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
}

impl fmt::Display for ValidationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.code)?;
        if let Some(object) = &self.object {
            write!(f, "{object}: ")?;
        }
        write!(f, "{} ({})", self.context, self.reference)
    }
}

/// Accumulator for the findings of one validation run.
///
/// Recording a finding never fails and never aborts the caller. A session
/// belongs to one call tree; it is passed down by `&mut` and handed back to
/// the top-level caller for inspection.
#[derive(Debug, Default, Serialize)]
pub struct ValidationSession {
    entries: Vec<ValidationEntry>,
    #[serde(skip)]
    scope: Option<String>,
}

impl ValidationSession {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute subsequent findings to `object` (or to nothing).
    pub fn set_scope(&mut self, object: Option<String>) {
        self.scope = object;
    }

    /// The object findings are currently attributed to.
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Record a MUST-level violation.
    pub fn error(&mut self, spec: SpecVersion, code: Code, context: impl Into<String>) {
        self.record(spec, code, Severity::Error, context.into());
    }

    /// Record a SHOULD-level violation.
    pub fn warning(&mut self, spec: SpecVersion, code: Code, context: impl Into<String>) {
        self.record(spec, code, Severity::Warning, context.into());
    }

    fn record(&mut self, spec: SpecVersion, code: Code, severity: Severity, context: String) {
        let resolved = resolve(spec, code);
        debug!(
            code = resolved.code.as_str(),
            %severity,
            object = self.scope.as_deref().unwrap_or(""),
            context = context.as_str(),
            "validation finding"
        );
        self.entries.push(ValidationEntry {
            code: resolved.code,
            severity,
            spec: resolved.spec,
            description: resolved.description,
            reference: resolved.reference,
            context,
            object: self.scope.clone(),
        });
    }

    /// Drop repeated findings, keeping the first of each `(code, object, context)`.
    pub fn compact(&mut self) {
        let mut seen = HashSet::new();
        self.entries
            .retain(|e| seen.insert((e.code, e.object.clone(), e.context.clone())));
    }

    /// Append every finding of `other`.
    pub fn combine(&mut self, other: ValidationSession) {
        self.entries.extend(other.entries);
    }

    /// All findings in recording order.
    pub fn entries(&self) -> &[ValidationEntry] {
        &self.entries
    }

    /// Error-severity findings.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationEntry> {
        self.entries.iter().filter(|e| e.severity == Severity::Error)
    }

    /// Warning-severity findings.
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationEntry> {
        self.entries.iter().filter(|e| e.severity == Severity::Warning)
    }

    /// Returns `true` when no error-severity finding was recorded.
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    /// Number of findings with `code`.
    pub fn count(&self, code: Code) -> usize {
        self.entries.iter().filter(|e| e.code == code).count()
    }

    /// Returns `true` if any finding has `code`.
    pub fn has(&self, code: Code) -> bool {
        self.count(code) > 0
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for ValidationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{} {entry}", entry.severity)?;
        }
        Ok(())
    }
}
