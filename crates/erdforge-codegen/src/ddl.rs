//! SQL DDL rendering
//!
//! SQLite-flavoured output: `INTEGER`, `REAL` and `TEXT` column types, with
//! booleans stored as `INTEGER`.

use erdforge_core::{Column, ColumnRole, ForeignKey, Index, SynthesizedSchema, Table};

use crate::naming::sql_ident;

/// Whether CREATE statements carry `IF NOT EXISTS`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMode {
    IfNotExists,
    Plain,
}

impl CreateMode {
    fn clause(self) -> &'static str {
        match self {
            Self::IfNotExists => "IF NOT EXISTS ",
            Self::Plain => "",
        }
    }
}

/// Render one column definition
pub fn column_definition(column: &Column) -> String {
    let name = sql_ident(&column.name);
    if column.role == ColumnRole::SurrogateKey {
        return format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", name);
    }

    let mut def = format!(
        "{} {} {}",
        name,
        column.sql_type(),
        if column.nullable { "NULL" } else { "NOT NULL" }
    );
    if let Some(default) = &column.default {
        def.push_str(&format!(" DEFAULT {}", default));
    }
    def
}

/// Column-level `REFERENCES` constraint
pub fn references_clause(fk: &ForeignKey) -> String {
    format!("REFERENCES {}({})", sql_ident(&fk.ref_table), sql_ident(&fk.ref_column))
}

/// Table-level `FOREIGN KEY` constraint
pub fn foreign_key_clause(fk: &ForeignKey) -> String {
    format!("FOREIGN KEY ({}) {}", sql_ident(&fk.column), references_clause(fk))
}

pub fn primary_key_clause(columns: &[String]) -> String {
    let columns: Vec<String> = columns.iter().map(|c| sql_ident(c)).collect();
    format!("PRIMARY KEY ({})", columns.join(", "))
}

/// Column and constraint lines of a table body
///
/// Entity tables carry each foreign key inline on its column and close with a
/// declared primary key constraint. Junction tables list both columns, then
/// the composite key, then both foreign key constraints. Table constraints
/// always follow every column definition.
fn table_body(table: &Table) -> Vec<String> {
    let mut lines = Vec::new();

    if table.is_junction() {
        lines.extend(table.columns.iter().map(column_definition));
        lines.push(primary_key_clause(&table.primary_key));
        lines.extend(table.foreign_keys.iter().map(foreign_key_clause));
        return lines;
    }

    for column in &table.columns {
        let mut def = column_definition(column);
        if let Some(fk) = table.foreign_key_for(&column.name) {
            def.push(' ');
            def.push_str(&references_clause(fk));
        }
        lines.push(def);
    }

    if !table.has_surrogate_key() && !table.primary_key.is_empty() {
        lines.push(primary_key_clause(&table.primary_key));
    }

    lines
}

pub fn create_table(table: &Table, mode: CreateMode) -> String {
    format!(
        "CREATE TABLE {}{} (\n    {}\n);",
        mode.clause(),
        sql_ident(&table.name),
        table_body(table).join(",\n    ")
    )
}

pub fn create_index(index: &Index, mode: CreateMode) -> String {
    format!(
        "CREATE INDEX {}{} ON {}({});",
        mode.clause(),
        sql_ident(&index.name),
        sql_ident(&index.table),
        sql_ident(&index.column)
    )
}

pub fn drop_table(table: &Table) -> String {
    format!("DROP TABLE IF EXISTS {};", sql_ident(&table.name))
}

/// CREATE statements for every table followed by the index block
pub(crate) fn create_statements(schema: &SynthesizedSchema, mode: CreateMode) -> Vec<String> {
    let mut blocks: Vec<String> = schema
        .all_tables()
        .map(|table| create_table(table, mode))
        .collect();

    if !schema.indexes.is_empty() {
        blocks.push(
            schema
                .indexes
                .iter()
                .map(|index| create_index(index, mode))
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }

    blocks
}

/// Render the schema as a DDL script
///
/// Entity tables in declaration order, then junction tables, then indexes.
/// The output depends only on the schema, so regenerating it is idempotent.
pub fn render_ddl(schema: &SynthesizedSchema) -> String {
    let blocks = create_statements(schema, CreateMode::IfNotExists);
    if blocks.is_empty() {
        return String::new();
    }
    format!("{}\n", blocks.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use erdforge_core::{Cardinality, Entity, ExtractionResult, ExtractionSource, Relationship};
    use erdforge_engine::synthesize;
    use pretty_assertions::assert_eq;

    fn schema(entities: Vec<Entity>, relationships: Vec<Relationship>) -> SynthesizedSchema {
        synthesize(
            &ExtractionResult::new(ExtractionSource::Text, 0.9)
                .with_entities(entities)
                .with_relationships(relationships),
        )
    }

    #[test]
    fn blog_ddl() {
        let schema = schema(
            vec![
                Entity::new("User")
                    .with_attributes(["id", "name", "email"])
                    .with_primary_keys(["id"]),
                Entity::new("Post")
                    .with_attributes(["id", "title", "user_id"])
                    .with_primary_keys(["id"])
                    .with_foreign_keys(["user_id"]),
            ],
            vec![Relationship::new("User", "Post", Cardinality::OneToMany)],
        );

        let expected = "\
CREATE TABLE IF NOT EXISTS user (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NULL,
    email TEXT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NULL
);

CREATE TABLE IF NOT EXISTS post (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NULL,
    user_id INTEGER NOT NULL REFERENCES user(id),
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NULL
);

CREATE INDEX IF NOT EXISTS idx_user_name ON user(name);
CREATE INDEX IF NOT EXISTS idx_user_email ON user(email);
CREATE INDEX IF NOT EXISTS idx_post_user_id ON post(user_id);
";
        assert_eq!(render_ddl(&schema), expected);
    }

    #[test]
    fn junction_table_ddl() {
        let schema = schema(
            vec![Entity::new("Student"), Entity::new("Course")],
            vec![Relationship::new("Student", "Course", Cardinality::ManyToMany)],
        );
        let junction = create_table(&schema.junctions[0], CreateMode::IfNotExists);

        let expected = "\
CREATE TABLE IF NOT EXISTS student_course (
    student_id INTEGER NOT NULL,
    course_id INTEGER NOT NULL,
    PRIMARY KEY (student_id, course_id),
    FOREIGN KEY (student_id) REFERENCES student(id),
    FOREIGN KEY (course_id) REFERENCES course(id)
);";
        assert_eq!(junction, expected);
    }

    #[test]
    fn declared_key_gets_table_constraint() {
        let schema = schema(
            vec![Entity::new("Country")
                .with_attributes(["iso_code", "name"])
                .with_primary_keys(["iso_code"])],
            Vec::new(),
        );
        let table = create_table(&schema.tables[0], CreateMode::Plain);

        let expected = "\
CREATE TABLE country (
    iso_code TEXT NOT NULL,
    name TEXT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NULL,
    PRIMARY KEY (iso_code)
);";
        assert_eq!(table, expected);
    }

    #[test]
    fn booleans_and_timestamps_map_to_sqlite_types() {
        let schema = schema(
            vec![Entity::new("Flag").with_attributes(["is_enabled", "expiry_date", "unit_price"])],
            Vec::new(),
        );
        let ddl = render_ddl(&schema);
        assert!(ddl.contains("is_enabled INTEGER NULL"));
        assert!(ddl.contains("expiry_date TEXT NULL"));
        assert!(ddl.contains("unit_price REAL NULL"));
    }

    #[test]
    fn reserved_words_are_quoted() {
        let schema = schema(
            vec![
                Entity::new("Order").with_attributes(["status", "group"]),
                Entity::new("Group").with_attributes(["title"]).with_foreign_keys(["order_id"]),
            ],
            vec![Relationship::new("Order", "Group", Cardinality::ManyToMany)],
        );
        let ddl = render_ddl(&schema);

        assert!(ddl.contains("CREATE TABLE IF NOT EXISTS \"order\" ("));
        assert!(ddl.contains("    \"group\" TEXT NULL,"));
        assert!(ddl.contains("    order_id INTEGER NOT NULL REFERENCES \"order\"(id),"));
        assert!(ddl.contains("FOREIGN KEY (group_id) REFERENCES \"group\"(id)"));
        assert!(ddl.contains("CREATE INDEX IF NOT EXISTS idx_order_status ON \"order\"(status);"));
        assert!(drop_table(&schema.tables[1]).contains("DROP TABLE IF EXISTS \"group\";"));
    }

    #[test]
    fn empty_schema_renders_nothing() {
        assert_eq!(render_ddl(&SynthesizedSchema::default()), "");
    }
}
