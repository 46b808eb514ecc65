//! Run report schema (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use crate::diagnostic::{Diagnostic, Severity};
use crate::ir::{ExtractionResult, ExtractionSource};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Summary statistics for a run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Total number of diagnostics
    pub total: usize,

    /// Number of errors
    pub errors: usize,

    /// Number of warnings
    pub warnings: usize,

    /// Number of info messages
    pub info: usize,

    /// Entities in the extraction result
    pub entities: usize,

    /// Relationships in the extraction result
    pub relationships: usize,

    /// Frontend confidence
    pub confidence: f64,
}

/// Kind of generated artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Ddl,
    Migration,
    Models,
    Database,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ddl => write!(f, "ddl"),
            Self::Migration => write!(f, "migration"),
            Self::Models => write!(f, "models"),
            Self::Database => write!(f, "database"),
        }
    }
}

/// A generated artifact written during the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub kind: ArtifactKind,

    /// Destination path as given by the caller
    pub path: String,

    /// Size in bytes
    pub bytes: usize,

    /// Hex SHA-256 of the artifact text
    pub sha256: String,
}

impl ArtifactRecord {
    /// Record an artifact and fingerprint its contents
    pub fn new(kind: ArtifactKind, path: impl Into<String>, contents: &str) -> Self {
        Self {
            kind,
            path: path.into(),
            bytes: contents.len(),
            sha256: fingerprint(contents),
        }
    }
}

/// Hex SHA-256 of generated text
pub fn fingerprint(contents: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents.as_bytes());
    hex::encode(hasher.finalize())
}

/// Run report (report.json v1)
///
/// This is the stable output format.
/// All fields are versioned and backward-compatible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    /// Which frontend produced the model
    pub source: ExtractionSource,

    /// Summary statistics
    pub summary: ReportSummary,

    /// Artifacts written during the run
    pub artifacts: Vec<ArtifactRecord>,

    /// All diagnostics
    pub diagnostics: Vec<Diagnostic>,

    /// Entity names, in the order they were extracted
    pub entities: Vec<String>,
}

impl RunReport {
    /// Start a report for an extraction result, carrying its diagnostics
    pub fn for_extraction(result: &ExtractionResult) -> Self {
        let mut report = Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            source: result.source,
            summary: ReportSummary {
                entities: result.entities.len(),
                relationships: result.relationships.len(),
                confidence: result.confidence,
                ..ReportSummary::default()
            },
            artifacts: Vec::new(),
            diagnostics: Vec::new(),
            entities: result.entities.iter().map(|e| e.name.clone()).collect(),
        };

        for diagnostic in &result.diagnostics {
            report.add_diagnostic(diagnostic.clone());
        }

        report
    }

    /// Add a diagnostic to the report
    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.summary.errors += 1,
            Severity::Warn => self.summary.warnings += 1,
            Severity::Info => self.summary.info += 1,
        }

        self.summary.total += 1;
        self.diagnostics.push(diagnostic);
    }

    /// Add several diagnostics
    pub fn extend_diagnostics<I: IntoIterator<Item = Diagnostic>>(&mut self, diagnostics: I) {
        for diagnostic in diagnostics {
            self.add_diagnostic(diagnostic);
        }
    }

    /// Record a written artifact
    pub fn add_artifact(&mut self, artifact: ArtifactRecord) {
        self.artifacts.push(artifact);
    }

    /// Check if the report has any errors
    pub fn has_errors(&self) -> bool {
        self.summary.errors > 0
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}
