//! Code generation errors

use erdforge_core::{
    DanglingReason, DanglingReference, Diagnostic, DiagnosticCode, Location, Severity,
};
use std::path::PathBuf;

/// Errors raised while generating or writing artifacts
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// Foreign keys do not point at an integer key of a generated table
    #[error("{} foreign key(s) cannot be created: {}", .dangling.len(), list(.dangling))]
    DanglingReference { dangling: Vec<DanglingReference> },

    /// Artifact could not be written
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generated SQL was rejected by the parser or by SQLite
    #[error("Generated SQL failed verification: {0}")]
    Verification(String),
}

impl CodegenError {
    /// Convert to diagnostics for the run report
    pub fn to_diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            Self::DanglingReference { dangling } => dangling
                .iter()
                .map(|d| {
                    let code = match d.reason {
                        DanglingReason::MissingTable => DiagnosticCode::DanglingForeignKey,
                        DanglingReason::NotAKey => DiagnosticCode::CompositeKeyTarget,
                        DanglingReason::KeyTypeMismatch => DiagnosticCode::KeyTypeMismatch,
                    };
                    Diagnostic::new(code, Severity::Error, format!("Foreign key {} cannot be created", d))
                        .with_location(Location::with_member(&d.table, &d.column))
                })
                .collect(),
            Self::Verification(reason) => vec![Diagnostic::new(
                DiagnosticCode::SqlVerificationFailed,
                Severity::Error,
                reason.clone(),
            )],
            // I/O failures abort the run instead of being reported
            Self::Io { .. } => Vec::new(),
        }
    }
}

fn list(dangling: &[DanglingReference]) -> String {
    dangling
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
