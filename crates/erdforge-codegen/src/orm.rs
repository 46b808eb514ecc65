//! ORM model source rendering
//!
//! One model per entity table plus one association model per junction table.
//! Model code is permissive: every field except a primary key is optional,
//! foreign keys included, even though the DDL marks foreign keys NOT NULL.
//!
//! Output languages sit behind [`ModelDialect`]; [`SqlModelDialect`] (Python
//! SQLModel) is the default and [`RustDialect`] emits serde structs.

use erdforge_core::{
    Column, ColumnRole, ForeignKey, ModelTarget, SemanticType, SynthesizedSchema, Table, TableKind,
};
use erdforge_engine::{model_optional, referenced_entity};

use crate::naming::{python_field, rust_field, to_pascal_case};

/// A target language for generated models
pub trait ModelDialect {
    /// Dialect name, for logs
    fn name(&self) -> &'static str;

    /// Imports and other file-level lines
    fn preamble(&self) -> String;

    /// Model for an entity table
    fn entity_model(&self, table: &Table) -> String;

    /// Model for a junction table
    fn association_model(&self, table: &Table) -> String;

    /// Render a whole models file
    fn render(&self, schema: &SynthesizedSchema) -> String {
        let blocks: Vec<String> = std::iter::once(self.preamble())
            .chain(schema.tables.iter().map(|t| self.entity_model(t)))
            .chain(schema.junctions.iter().map(|t| self.association_model(t)))
            .collect();
        format!("{}\n", blocks.join("\n\n\n"))
    }
}

/// Dialect for a configured target
pub fn dialect_for(target: ModelTarget) -> Box<dyn ModelDialect> {
    match target {
        ModelTarget::SqlModel => Box::new(SqlModelDialect),
        ModelTarget::Rust => Box::new(RustDialect),
    }
}

/// Model type name for a table
pub fn model_name(table: &Table) -> String {
    match &table.kind {
        TableKind::Entity { entity } => to_pascal_case(entity),
        TableKind::Junction { left, right } => {
            format!("{}{}", to_pascal_case(left), to_pascal_case(right))
        }
    }
}

/// Navigation field for a foreign key: field name and target model name
///
/// Named after the referenced entity, lower-cased. A resolved reference uses
/// the target entity's own name so the type matches its generated model.
fn relation_field(fk: &ForeignKey) -> (String, String) {
    let target = fk
        .ref_entity
        .clone()
        .unwrap_or_else(|| referenced_entity(&fk.column));
    let model = to_pascal_case(&target);
    (model.to_lowercase(), model)
}

/// Navigation fields that do not clash with a column or each other
fn relation_fields(table: &Table) -> Vec<(String, String)> {
    let mut fields: Vec<(String, String)> = Vec::new();
    for fk in &table.foreign_keys {
        let (field, model) = relation_field(fk);
        if field.is_empty()
            || table.find_column(&field).is_some()
            || fields.iter().any(|(f, _)| *f == field)
        {
            continue;
        }
        fields.push((field, model));
    }
    fields
}

fn split_audit(table: &Table) -> (Vec<&Column>, Vec<&Column>) {
    table.columns.iter().partition(|c| c.role != ColumnRole::Audit)
}

fn display_name(table: &Table) -> String {
    match &table.kind {
        TableKind::Entity { entity } => format!("{} model", entity),
        TableKind::Junction { left, right } => format!("{} {} relationship", left, right),
    }
}

/// Python SQLModel classes
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlModelDialect;

impl SqlModelDialect {
    fn python_type(semantic_type: SemanticType) -> &'static str {
        match semantic_type {
            SemanticType::Integer => "int",
            SemanticType::Real => "float",
            SemanticType::Boolean => "bool",
            SemanticType::Timestamp => "datetime",
            SemanticType::Text => "str",
        }
    }

    /// One class attribute
    ///
    /// A column whose name is a Python keyword gets a trailing underscore and
    /// keeps its database name through `sa_column_kwargs`.
    fn field(column: &Column, fk: Option<&ForeignKey>) -> String {
        let ty = Self::python_type(column.semantic_type);
        let annotation = if model_optional(column) {
            format!("Optional[{}]", ty)
        } else {
            ty.to_string()
        };

        let mut args: Vec<String> = match column.role {
            ColumnRole::SurrogateKey => vec!["default=None".into(), "primary_key=True".into()],
            ColumnRole::PrimaryKey => vec!["primary_key=True".into()],
            ColumnRole::ForeignKey => vec!["default=None".into()],
            ColumnRole::Audit if column.default.is_some() => {
                vec!["default_factory=datetime.utcnow".into()]
            }
            ColumnRole::Attribute | ColumnRole::Audit => Vec::new(),
        };
        if let Some(fk) = fk {
            args.push(format!("foreign_key=\"{}.{}\"", fk.ref_table, fk.ref_column));
        }

        let name = python_field(&column.name);
        if name != column.name {
            if args.is_empty() {
                args.push("default=None".into());
            }
            args.push(format!("sa_column_kwargs={{\"name\": \"{}\"}}", column.name));
        }

        let value = if args.is_empty() {
            "None".to_string()
        } else {
            format!("Field({})", args.join(", "))
        };
        format!("    {}: {} = {}", name, annotation, value)
    }

    fn header(table: &Table) -> Vec<String> {
        vec![
            format!("class {}(SQLModel, table=True):", model_name(table)),
            format!("    \"\"\"{}\"\"\"", display_name(table)),
            format!("    __tablename__ = \"{}\"", table.name),
            String::new(),
        ]
    }
}

impl ModelDialect for SqlModelDialect {
    fn name(&self) -> &'static str {
        "sqlmodel"
    }

    fn preamble(&self) -> String {
        [
            "from datetime import datetime",
            "from typing import Optional",
            "",
            "from sqlmodel import Field, Relationship, SQLModel",
        ]
        .join("\n")
    }

    fn entity_model(&self, table: &Table) -> String {
        let mut lines = Self::header(table);
        let (columns, audit) = split_audit(table);

        for column in columns {
            lines.push(Self::field(column, table.foreign_key_for(&column.name)));
        }
        for (field, model) in relation_fields(table) {
            lines.push(format!(
                "    {}: Optional[\"{}\"] = Relationship()",
                python_field(&field),
                model
            ));
        }
        for column in audit {
            lines.push(Self::field(column, None));
        }

        lines.join("\n")
    }

    fn association_model(&self, table: &Table) -> String {
        let mut lines = Self::header(table);
        for column in &table.columns {
            let ty = Self::python_type(column.semantic_type);
            match table.foreign_key_for(&column.name) {
                Some(fk) => lines.push(format!(
                    "    {}: {} = Field(foreign_key=\"{}.{}\", primary_key=True)",
                    python_field(&column.name),
                    ty,
                    fk.ref_table,
                    fk.ref_column
                )),
                None => lines.push(format!(
                    "    {}: {} = Field(primary_key=True)",
                    python_field(&column.name),
                    ty
                )),
            }
        }
        lines.join("\n")
    }
}

/// Rust structs with serde derives
#[derive(Debug, Clone, Copy, Default)]
pub struct RustDialect;

impl RustDialect {
    fn rust_type(semantic_type: SemanticType) -> &'static str {
        match semantic_type {
            SemanticType::Integer => "i64",
            SemanticType::Real => "f64",
            SemanticType::Boolean => "bool",
            SemanticType::Timestamp => "NaiveDateTime",
            SemanticType::Text => "String",
        }
    }

    /// Struct fields; association models keep every key column required
    fn model(table: &Table, optional_keys: bool) -> String {
        let mut lines = vec![
            format!("/// {} (table `{}`)", display_name(table), table.name),
            "#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]".to_string(),
            format!("pub struct {} {{", model_name(table)),
        ];
        for column in &table.columns {
            if let Some(fk) = table.foreign_key_for(&column.name) {
                lines.push(format!("    /// References `{}.{}`", fk.ref_table, fk.ref_column));
            }
            let ty = Self::rust_type(column.semantic_type);
            let ty = if optional_keys && model_optional(column) {
                format!("Option<{}>", ty)
            } else {
                ty.to_string()
            };
            lines.push(format!("    pub {}: {},", rust_field(&column.name), ty));
        }
        lines.push("}".to_string());
        lines.join("\n")
    }
}

impl ModelDialect for RustDialect {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn preamble(&self) -> String {
        [
            "//! Models generated from an ERD",
            "",
            "use chrono::NaiveDateTime;",
            "use serde::{Deserialize, Serialize};",
        ]
        .join("\n")
    }

    fn entity_model(&self, table: &Table) -> String {
        Self::model(table, true)
    }

    fn association_model(&self, table: &Table) -> String {
        Self::model(table, false)
    }
}

/// Render models for `schema` in the given target
pub fn render_models(schema: &SynthesizedSchema, target: ModelTarget) -> String {
    let dialect = dialect_for(target);
    tracing::debug!(dialect = dialect.name(), "rendering models");
    dialect.render(schema)
}
