//! Error taxonomy for catalog construction.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Process exit codes. Callers rely on these to tell configuration
/// problems (missing archive) apart from I/O problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    StrictWarnings = 2,
    Failure = 3,
    ArchiveNotFound = 10,
    ArchiveReadFailed = 11,
    MalformedDefinition = 12,
    CyclicRulesets = 13,
    CatalogWriteFailed = 14,
    IncompleteCatalog = 15,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no rule archive found for language {language} at {}", .path.display())]
    ArchiveNotFound { language: String, path: PathBuf },

    #[error("failed to read rule archive {}: {source}", .path.display())]
    ArchiveReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed definition {path}: {reason}")]
    MalformedDefinition { path: String, reason: String },

    #[error("ruleset {ruleset} imports unknown ruleset {missing}")]
    DanglingRulesetReference { ruleset: String, missing: String },

    #[error("cyclic ruleset import: {}", .cycle.join(" -> "))]
    CyclicRulesetReference { cycle: Vec<String> },

    #[error("ruleset {ruleset} references unknown rule {reference}")]
    DanglingRuleReference { ruleset: String, reference: String },

    #[error("failed to write catalog to {}: {source}", .path.display())]
    CatalogWriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("catalog assembled before linking finished for: {}", .missing.join(", "))]
    IncompleteCatalog { missing: Vec<String> },
}

impl CatalogError {
    /// Short stable identifier, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogError::ArchiveNotFound { .. } => "ArchiveNotFound",
            CatalogError::ArchiveReadError { .. } => "ArchiveReadError",
            CatalogError::MalformedDefinition { .. } => "MalformedDefinition",
            CatalogError::DanglingRulesetReference { .. } => "DanglingRulesetReference",
            CatalogError::CyclicRulesetReference { .. } => "CyclicRulesetReference",
            CatalogError::DanglingRuleReference { .. } => "DanglingRuleReference",
            CatalogError::CatalogWriteError { .. } => "CatalogWriteError",
            CatalogError::IncompleteCatalog { .. } => "IncompleteCatalog",
        }
    }

    /// Dangling references are recovered locally; everything else makes a
    /// language's data untrustworthy as a whole.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            CatalogError::DanglingRulesetReference { .. }
                | CatalogError::DanglingRuleReference { .. }
        )
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            CatalogError::ArchiveNotFound { .. } => ExitCode::ArchiveNotFound,
            CatalogError::ArchiveReadError { .. } => ExitCode::ArchiveReadFailed,
            CatalogError::MalformedDefinition { .. } => ExitCode::MalformedDefinition,
            CatalogError::CyclicRulesetReference { .. } => ExitCode::CyclicRulesets,
            CatalogError::CatalogWriteError { .. } => ExitCode::CatalogWriteFailed,
            CatalogError::IncompleteCatalog { .. } => ExitCode::IncompleteCatalog,
            // Never surfaced as a run failure on their own.
            CatalogError::DanglingRulesetReference { .. }
            | CatalogError::DanglingRuleReference { .. } => ExitCode::Failure,
        }
    }
}

/// Map an application-level error to the process exit code.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<CatalogError>()
        .map(|e| e.exit_code())
        .unwrap_or(ExitCode::Failure)
        .code()
}
