//! erdforge core
//!
//! Domain model shared by every pipeline stage: the extraction IR, the
//! synthesized schema, diagnostics, configuration and run reports.
//! Never rename diagnostic codes - they are part of the public API.

pub mod ir;
pub mod diagnostic;
pub mod schema;
pub mod report;
pub mod config;

pub use ir::{
    BoundingBox, Cardinality, Entity, ExtractionResult, ExtractionSource, Point, Relationship,
    RelationshipKind,
};
pub use diagnostic::{Diagnostic, DiagnosticCode, Severity, Location};
pub use schema::{
    Column, ColumnDefault, ColumnRole, DanglingReason, DanglingReference, ForeignKey, Index, SemanticType,
    SqlType, SynthesizedSchema, Table, TableKind,
};
pub use report::{ArtifactKind, ArtifactRecord, RunReport, ReportVersion, fingerprint};
pub use config::{Config, ConfigError, ExtractionConfig, GenerationConfig, ModelTarget, SeverityThreshold};
