//! Schema synthesis
//!
//! Derives the logical schema from one extraction result:
//! - one table per entity, in declaration order
//! - a junction table per usable many-to-many relationship
//! - foreign keys resolved by table-name lookup
//! - a deterministic index set
//!
//! Synthesis is a pure function of its input: the same result always yields
//! the same schema, diagnostics included.

use erdforge_core::{
    Cardinality, Column, ColumnDefault, ColumnRole, DanglingReason, Diagnostic, DiagnosticCode,
    Entity, ExtractionResult, ForeignKey, Index, Location, Relationship, SemanticType, Severity,
    SeverityThreshold, SqlType, SynthesizedSchema, Table, TableKind,
};
use std::collections::HashSet;

use crate::inference::{ddl_nullable, infer_type, is_index_candidate, referenced_entity};

/// Name of the synthetic primary key
pub const SURROGATE_KEY: &str = "id";

/// Audit columns appended to every entity table
pub const AUDIT_COLUMNS: [&str; 2] = ["created_at", "updated_at"];

/// Schema synthesizer
#[derive(Debug, Clone, Default)]
pub struct SchemaSynthesizer {
    severity: SeverityThreshold,
}

impl SchemaSynthesizer {
    /// Create a synthesizer with default diagnostic severities
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply severity overrides to emitted diagnostics
    pub fn with_severity(mut self, severity: SeverityThreshold) -> Self {
        self.severity = severity;
        self
    }

    /// Synthesize a schema from an extraction result
    pub fn synthesize(&self, result: &ExtractionResult) -> SynthesizedSchema {
        let mut run = Synthesis {
            severity: &self.severity,
            diagnostics: Vec::new(),
        };

        let entities = run.unique_entities(&result.entities);
        let tables: Vec<Table> = entities
            .iter()
            .map(|entity| run.entity_table(entity, &entities))
            .collect();

        let relationships = run.usable_relationships(result);
        let junctions = run.junction_tables(&relationships, &entities);
        let indexes = entity_indexes(&entities);

        let mut schema = SynthesizedSchema {
            tables,
            junctions,
            indexes,
            diagnostics: Vec::new(),
        };

        // Key mismatches were reported while resolving the reference
        for dangling in schema
            .validate_references()
            .into_iter()
            .filter(|d| d.reason == DanglingReason::MissingTable)
        {
            run.report(
                Diagnostic::new(
                    DiagnosticCode::DanglingForeignKey,
                    Severity::Error,
                    format!(
                        "Foreign key '{}.{}' references table '{}' which is not generated",
                        dangling.table, dangling.column, dangling.ref_table
                    ),
                )
                .with_location(Location::with_member(&dangling.table, &dangling.column)),
            );
        }

        schema.diagnostics = run.diagnostics;

        tracing::debug!(
            tables = schema.tables.len(),
            junctions = schema.junctions.len(),
            indexes = schema.indexes.len(),
            diagnostics = schema.diagnostics.len(),
            "synthesized schema"
        );

        schema
    }
}

/// Synthesize with default settings
pub fn synthesize(result: &ExtractionResult) -> SynthesizedSchema {
    SchemaSynthesizer::new().synthesize(result)
}

/// Per-run state: only the diagnostics collected so far
struct Synthesis<'a> {
    severity: &'a SeverityThreshold,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Synthesis<'a> {
    fn report(&mut self, mut diagnostic: Diagnostic) {
        diagnostic.severity = self.severity.get_severity(diagnostic.code, diagnostic.severity);
        if diagnostic.severity >= Severity::Warn {
            tracing::warn!(code = %diagnostic.code, "{}", diagnostic.message);
        }
        self.diagnostics.push(diagnostic);
    }

    /// First entity per table name wins
    fn unique_entities<'e>(&mut self, entities: &'e [Entity]) -> Vec<&'e Entity> {
        let mut seen = HashSet::new();
        let mut kept = Vec::new();

        for entity in entities {
            let table = entity.table_name();
            if seen.insert(table.clone()) {
                kept.push(entity);
            } else {
                self.report(
                    Diagnostic::new(
                        DiagnosticCode::DuplicateTable,
                        Severity::Warn,
                        format!("Entity '{}' maps to table '{}' which is already defined; skipped", entity.name, table),
                    )
                    .with_location(Location::new(&entity.name)),
                );
            }
        }

        kept
    }

    fn entity_table(&mut self, entity: &Entity, entities: &[&Entity]) -> Table {
        let name = entity.table_name();
        let key_columns = key_columns(entity);
        let surrogate = key_columns == [SURROGATE_KEY];

        let mut columns: Vec<Column> = Vec::new();
        let mut emitted: HashSet<String> = HashSet::new();

        if surrogate {
            columns.push(
                Column::new(SURROGATE_KEY, SemanticType::Integer)
                    .with_nullable(false)
                    .with_role(ColumnRole::SurrogateKey),
            );
        } else {
            for key in &key_columns {
                columns.push(
                    Column::new(key.clone(), infer_type(key))
                        .with_nullable(false)
                        .with_role(ColumnRole::PrimaryKey),
                );
            }
        }
        emitted.extend(key_columns.iter().cloned());

        for attr in &entity.attributes {
            if emitted.contains(attr)
                || entity.is_foreign_key(attr)
                || AUDIT_COLUMNS.contains(&attr.as_str())
            {
                continue;
            }
            if surrogate && attr == SURROGATE_KEY {
                continue;
            }
            columns.push(
                Column::new(attr.clone(), infer_type(attr)).with_nullable(ddl_nullable(entity, attr)),
            );
            emitted.insert(attr.clone());
        }

        let mut foreign_keys = Vec::new();
        for fk in &entity.foreign_keys {
            if emitted.insert(fk.clone()) {
                columns.push(
                    Column::new(fk.clone(), SemanticType::Integer)
                        .with_nullable(false)
                        .with_role(ColumnRole::ForeignKey),
                );
            }
            foreign_keys.push(self.resolve_foreign_key(&name, fk, entities));
        }

        columns.push(
            Column::new(AUDIT_COLUMNS[0], SemanticType::Timestamp)
                .with_nullable(false)
                .with_role(ColumnRole::Audit)
                .with_default(ColumnDefault::CurrentTimestamp),
        );
        columns.push(
            Column::new(AUDIT_COLUMNS[1], SemanticType::Timestamp)
                .with_nullable(true)
                .with_role(ColumnRole::Audit),
        );

        Table {
            name,
            kind: TableKind::Entity {
                entity: entity.name.clone(),
            },
            columns,
            primary_key: key_columns,
            foreign_keys,
        }
    }

    /// Resolve by table name; unresolved targets keep the guessed name
    fn resolve_foreign_key(&mut self, table: &str, fk: &str, entities: &[&Entity]) -> ForeignKey {
        let ref_table = referenced_entity(fk).to_lowercase();

        match entities.iter().find(|e| e.table_name() == ref_table) {
            Some(target) => ForeignKey {
                column: fk.to_string(),
                ref_column: self.reference_column(target, table, fk),
                ref_table,
                ref_entity: Some(target.name.clone()),
            },
            None => ForeignKey {
                column: fk.to_string(),
                ref_table,
                ref_column: SURROGATE_KEY.to_string(),
                ref_entity: None,
            },
        }
    }

    /// Column a reference to `target` points at
    ///
    /// Foreign key columns are integers, so only an integer single-column key
    /// is a valid target. Other targets are reported here; strict generation
    /// rejects them later through `validate_references`.
    fn reference_column(&mut self, target: &Entity, table: &str, column: &str) -> String {
        let keys = key_columns(target);
        let location = Location::with_member(table, column);

        if let [key] = keys.as_slice() {
            let key_type = infer_type(key).sql_type();
            if key_type != SqlType::Integer {
                self.report(
                    Diagnostic::new(
                        DiagnosticCode::KeyTypeMismatch,
                        Severity::Error,
                        format!(
                            "'{}.{}' references '{}' whose primary key is not an integer",
                            table,
                            column,
                            target.table_name()
                        ),
                    )
                    .with_location(location)
                    .with_comparison("integer key", format!("{} {}", key, key_type)),
                );
            }
            return key.clone();
        }

        self.report(
            Diagnostic::new(
                DiagnosticCode::CompositeKeyTarget,
                Severity::Error,
                format!(
                    "'{}.{}' references '{}' whose primary key is composite",
                    table,
                    column,
                    target.table_name()
                ),
            )
            .with_location(location)
            .with_comparison("single-column key", keys.join(", ")),
        );
        SURROGATE_KEY.to_string()
    }

    /// Drop relationships whose endpoints are not entities in the result
    fn usable_relationships<'r>(&mut self, result: &'r ExtractionResult) -> Vec<&'r Relationship> {
        let mut usable = Vec::new();

        for rel in &result.relationships {
            let missing: Vec<&str> = [rel.entity1.as_str(), rel.entity2.as_str()]
                .into_iter()
                .filter(|name| result.find_entity(name).is_none())
                .collect();

            if missing.is_empty() {
                usable.push(rel);
            } else {
                self.report(
                    Diagnostic::new(
                        DiagnosticCode::DanglingRelationship,
                        Severity::Warn,
                        format!(
                            "Relationship {} -[{}]-> {} references unknown entity '{}'; dropped",
                            rel.entity1,
                            rel.cardinality,
                            rel.entity2,
                            missing.join("', '")
                        ),
                    )
                    .with_location(Location::new(missing[0])),
                );
            }
        }

        usable
    }

    fn junction_tables(&mut self, relationships: &[&Relationship], entities: &[&Entity]) -> Vec<Table> {
        let mut junctions: Vec<Table> = Vec::new();

        for rel in relationships.iter().filter(|r| r.cardinality == Cardinality::ManyToMany) {
            let left = rel.entity1.to_lowercase();
            let right = rel.entity2.to_lowercase();
            let name = format!("{}_{}", left, right);

            let taken = entities.iter().any(|e| e.table_name() == name)
                || junctions.iter().any(|j| j.name == name);
            if taken {
                self.report(
                    Diagnostic::new(
                        DiagnosticCode::DuplicateTable,
                        Severity::Warn,
                        format!(
                            "Junction table '{}' for {} N:M {} is already defined; skipped",
                            name, rel.entity1, rel.entity2
                        ),
                    )
                    .with_location(Location::new(&name)),
                );
                continue;
            }

            let left_column = format!("{}_id", left);
            let right_column = if left == right {
                format!("related_{}_id", right)
            } else {
                format!("{}_id", right)
            };

            let foreign_keys = [(&left_column, &rel.entity1), (&right_column, &rel.entity2)]
                .into_iter()
                .map(|(column, entity_name)| {
                    let target = entities.iter().find(|e| e.table_name() == entity_name.to_lowercase());
                    ForeignKey {
                        column: column.clone(),
                        ref_table: entity_name.to_lowercase(),
                        ref_column: match target {
                            Some(target) => self.reference_column(target, &name, column),
                            None => SURROGATE_KEY.to_string(),
                        },
                        ref_entity: target.map(|t| t.name.clone()),
                    }
                })
                .collect();

            junctions.push(Table {
                name: name.clone(),
                kind: TableKind::Junction {
                    left: rel.entity1.clone(),
                    right: rel.entity2.clone(),
                },
                columns: [&left_column, &right_column]
                    .into_iter()
                    .map(|c| {
                        Column::new(c.clone(), SemanticType::Integer)
                            .with_nullable(false)
                            .with_role(ColumnRole::ForeignKey)
                    })
                    .collect(),
                primary_key: vec![left_column, right_column],
                foreign_keys,
            });
        }

        junctions
    }
}

/// Primary key columns: declared keys, or the surrogate `id`
fn key_columns(entity: &Entity) -> Vec<String> {
    if entity.primary_keys.is_empty() {
        vec![SURROGATE_KEY.to_string()]
    } else {
        entity.primary_keys.clone()
    }
}

/// Foreign key indexes, then name-like attribute indexes, de-duplicated by name
fn entity_indexes(entities: &[&Entity]) -> Vec<Index> {
    let mut indexes: Vec<Index> = Vec::new();

    for entity in entities {
        let table = entity.table_name();
        let candidates = entity
            .foreign_keys
            .iter()
            .chain(entity.attributes.iter().filter(|a| is_index_candidate(a)));

        for column in candidates {
            let index = Index::for_column(&table, column);
            if !indexes.iter().any(|i| i.name == index.name) {
                indexes.push(index);
            }
        }
    }

    indexes
}
