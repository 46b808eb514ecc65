//! Synthesized schema types and the semantic type system

use serde::{Deserialize, Serialize};
use crate::diagnostic::{Diagnostic, Severity};

/// Semantic type inferred from an attribute name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Integer,
    Real,
    Boolean,
    Timestamp,
    Text,
}

impl SemanticType {
    /// Storage type on the single-file relational target
    pub fn sql_type(&self) -> SqlType {
        match self {
            Self::Integer | Self::Boolean => SqlType::Integer,
            Self::Real => SqlType::Real,
            Self::Timestamp | Self::Text => SqlType::Text,
        }
    }
}

impl std::fmt::Display for SemanticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer => write!(f, "integer"),
            Self::Real => write!(f, "real"),
            Self::Boolean => write!(f, "boolean"),
            Self::Timestamp => write!(f, "timestamp"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// Column storage type in generated DDL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SqlType {
    Integer,
    Real,
    Text,
}

impl std::fmt::Display for SqlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer => write!(f, "INTEGER"),
            Self::Real => write!(f, "REAL"),
            Self::Text => write!(f, "TEXT"),
        }
    }
}

/// Why a column exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Synthetic `id` key, auto-incremented
    SurrogateKey,

    /// Declared primary key column
    PrimaryKey,

    /// Ordinary data attribute
    Attribute,

    /// Reference to another table
    ForeignKey,

    /// `created_at` / `updated_at`
    Audit,
}

/// Default value expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnDefault {
    CurrentTimestamp,
}

impl std::fmt::Display for ColumnDefault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CurrentTimestamp => write!(f, "CURRENT_TIMESTAMP"),
        }
    }
}

/// A column in a synthesized table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub name: String,

    pub semantic_type: SemanticType,

    pub nullable: bool,

    pub role: ColumnRole,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ColumnDefault>,
}

impl Column {
    /// Create a nullable attribute column
    pub fn new(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            semantic_type,
            nullable: true,
            role: ColumnRole::Attribute,
            default: None,
        }
    }

    /// Set nullability
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set role
    pub fn with_role(mut self, role: ColumnRole) -> Self {
        self.role = role;
        self
    }

    /// Set default expression
    pub fn with_default(mut self, default: ColumnDefault) -> Self {
        self.default = Some(default);
        self
    }

    pub fn sql_type(&self) -> SqlType {
        self.semantic_type.sql_type()
    }
}

/// Foreign key constraint from one column to another table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Referencing column in the owning table
    pub column: String,

    /// Referenced table
    pub ref_table: String,

    /// Referenced column
    pub ref_column: String,

    /// Entity name of the referenced table when it was resolved
    pub ref_entity: Option<String>,
}

/// Secondary index on a single column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub table: String,
    pub column: String,
}

impl Index {
    /// Create an index named `idx_<table>_<column>`
    pub fn for_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        let table = table.into();
        let column = column.into();
        Self {
            name: format!("idx_{}_{}", table, column),
            table,
            column,
        }
    }
}

/// What a table was synthesized from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableKind {
    /// One table per entity
    Entity { entity: String },

    /// Many-to-many junction between two entities
    Junction { left: String, right: String },
}

/// A synthesized table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,

    pub kind: TableKind,

    /// Ordered columns
    pub columns: Vec<Column>,

    /// Primary key column names
    pub primary_key: Vec<String>,

    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Foreign key declared on a column, if any
    pub fn foreign_key_for(&self, column: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.column == column)
    }

    /// True when the key is the synthetic auto-increment `id`
    pub fn has_surrogate_key(&self) -> bool {
        self.columns.iter().any(|c| c.role == ColumnRole::SurrogateKey)
    }

    pub fn is_junction(&self) -> bool {
        matches!(self.kind, TableKind::Junction { .. })
    }

    /// Entity name the table was synthesized from
    pub fn entity_name(&self) -> Option<&str> {
        match &self.kind {
            TableKind::Entity { entity } => Some(entity),
            TableKind::Junction { .. } => None,
        }
    }
}

/// Why a foreign key cannot be created as declared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DanglingReason {
    /// The referenced table is not part of the schema
    MissingTable,

    /// The referenced column is not the table's single-column primary key
    NotAKey,

    /// The referenced key is not an integer, but foreign key columns are
    KeyTypeMismatch,
}

/// Foreign key that does not resolve to an integer key of a generated table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    pub table: String,
    pub column: String,
    pub ref_table: String,
    pub ref_column: String,
    pub reason: DanglingReason,
}

impl std::fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.reason {
            DanglingReason::MissingTable => {
                write!(f, "{}.{} -> {} (no such table)", self.table, self.column, self.ref_table)
            }
            DanglingReason::NotAKey => write!(
                f,
                "{}.{} -> {}({}) (not a single-column key)",
                self.table, self.column, self.ref_table, self.ref_column
            ),
            DanglingReason::KeyTypeMismatch => write!(
                f,
                "{}.{} -> {}({}) (key is not an integer)",
                self.table, self.column, self.ref_table, self.ref_column
            ),
        }
    }
}

/// Logical schema derived from one extraction result
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SynthesizedSchema {
    /// Entity tables in declaration order
    pub tables: Vec<Table>,

    /// Junction tables in relationship declaration order
    pub junctions: Vec<Table>,

    pub indexes: Vec<Index>,

    /// Conditions met while synthesizing
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl SynthesizedSchema {
    /// Entity tables followed by junction tables
    pub fn all_tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter().chain(self.junctions.iter())
    }

    /// Find any table by name
    pub fn find_table(&self, name: &str) -> Option<&Table> {
        self.all_tables().find(|t| t.name == name)
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.find_table(name).is_some()
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.all_tables().map(|t| t.name.as_str()).collect()
    }

    /// Foreign keys that do not point at an integer single-column key of a
    /// generated table
    pub fn validate_references(&self) -> Vec<DanglingReference> {
        let mut dangling = Vec::new();

        for table in self.all_tables() {
            for fk in &table.foreign_keys {
                let reason = match self.find_table(&fk.ref_table) {
                    None => Some(DanglingReason::MissingTable),
                    Some(target) => match target.find_column(&fk.ref_column) {
                        Some(key) if target.primary_key == [fk.ref_column.as_str()] => {
                            (key.sql_type() != SqlType::Integer)
                                .then_some(DanglingReason::KeyTypeMismatch)
                        }
                        _ => Some(DanglingReason::NotAKey),
                    },
                };

                if let Some(reason) = reason {
                    dangling.push(DanglingReference {
                        table: table.name.clone(),
                        column: fk.column.clone(),
                        ref_table: fk.ref_table.clone(),
                        ref_column: fk.ref_column.clone(),
                        reason,
                    });
                }
            }
        }

        dangling
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }
}
