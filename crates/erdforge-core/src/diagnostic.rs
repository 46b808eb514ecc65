//! Diagnostic codes and error reporting
//!
//! IMPORTANT: Diagnostic codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the public API.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry (v1)
///
/// These codes are STABLE and VERSIONED.
/// Do NOT rename or remove codes - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // Extraction
    /// No usable text in a region; placeholder names were assigned
    DegradedExtraction,

    /// A recognized line could not be turned into an attribute
    UnreadableRegionLine,

    // Model consistency
    /// Relationship names an entity that is not in the result
    DanglingRelationship,

    /// Two entities or junctions map to the same table name
    DuplicateTable,

    // Generation
    /// Foreign key targets a table that was not generated
    DanglingForeignKey,

    /// Foreign key targets a table whose key is composite
    CompositeKeyTarget,

    /// Foreign key targets a single-column key that is not an integer
    KeyTypeMismatch,

    /// Generated SQL could not be parsed back
    SqlVerificationFailed,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DegradedExtraction => "DEGRADED_EXTRACTION",
            Self::UnreadableRegionLine => "UNREADABLE_REGION_LINE",
            Self::DanglingRelationship => "DANGLING_RELATIONSHIP",
            Self::DuplicateTable => "DUPLICATE_TABLE",
            Self::DanglingForeignKey => "DANGLING_FOREIGN_KEY",
            Self::CompositeKeyTarget => "COMPOSITE_KEY_TARGET",
            Self::KeyTypeMismatch => "KEY_TYPE_MISMATCH",
            Self::SqlVerificationFailed => "SQL_VERIFICATION_FAILED",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Warning - the run continued with a degraded result
    Warn,

    /// Error - generated artifacts would be unsound
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Where in the model a diagnostic applies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Entity or table name
    pub subject: String,

    /// Attribute or column, if any
    pub member: Option<String>,
}

impl Location {
    /// Location naming just an entity or table
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            member: None,
        }
    }

    /// Location naming a member of an entity or table
    pub fn with_member(subject: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            member: Some(member.into()),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.member {
            Some(member) => write!(f, "{}.{}", self.subject, member),
            None => write!(f, "{}", self.subject),
        }
    }
}

/// A diagnostic message with structured metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Entity/table the diagnostic is about (best-effort)
    pub location: Option<Location>,

    /// Expected value (for comparison diagnostics)
    pub expected: Option<String>,

    /// Actual value (for comparison diagnostics)
    pub actual: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            location: None,
            expected: None,
            actual: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Set expected/actual values
    pub fn with_comparison(mut self, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_code_stability() {
        // Ensure codes are stable strings
        assert_eq!(DiagnosticCode::DanglingRelationship.as_str(), "DANGLING_RELATIONSHIP");
        assert_eq!(DiagnosticCode::DegradedExtraction.as_str(), "DEGRADED_EXTRACTION");
        assert_eq!(DiagnosticCode::DanglingForeignKey.as_str(), "DANGLING_FOREIGN_KEY");
    }

    #[test]
    fn serde_names_match_stable_codes() {
        let codes = [
            DiagnosticCode::DegradedExtraction,
            DiagnosticCode::UnreadableRegionLine,
            DiagnosticCode::DanglingRelationship,
            DiagnosticCode::DuplicateTable,
            DiagnosticCode::DanglingForeignKey,
            DiagnosticCode::CompositeKeyTarget,
            DiagnosticCode::KeyTypeMismatch,
            DiagnosticCode::SqlVerificationFailed,
        ];
        for code in codes {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn diagnostic_serialization() {
        let diag = Diagnostic::new(
            DiagnosticCode::DanglingForeignKey,
            Severity::Error,
            "Foreign key 'post.user_id' references missing table 'user'"
        )
        .with_location(Location::with_member("post", "user_id"));

        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("DANGLING_FOREIGN_KEY"));
        assert!(json.contains("error"));
        assert_eq!(diag.location.unwrap().to_string(), "post.user_id");
    }
}
