use std::fmt;

use crate::error::CatalogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn letter(&self) -> char {
        match self {
            Severity::Warning => 'W',
            Severity::Error => 'E',
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A problem that did not stop the catalog from being written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub language: String,
    pub severity: Severity,
    /// `CatalogError::kind` of the underlying condition.
    pub kind: &'static str,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(language: &str, err: &CatalogError) -> Self {
        Self {
            language: language.to_string(),
            severity: Severity::Warning,
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// A language left out of the catalog.
    pub fn error(language: &str, err: &CatalogError) -> Self {
        Self {
            severity: Severity::Error,
            ..Self::warning(language, err)
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}: {}: {}",
            self.language, self.severity, self.kind, self.message
        )
    }
}
