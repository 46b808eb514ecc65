//! Migration script rendering
//!
//! A full drop/create script. Entity tables are dropped in reverse declaration
//! order so referencing tables go before the tables they reference, then the
//! junction tables are dropped. Tables are re-created in forward order,
//! followed by junction tables and indexes.

use chrono::{DateTime, Utc};
use erdforge_core::SynthesizedSchema;

use crate::ddl::{CreateMode, create_statements, drop_table};

pub const HEADER: &str = "-- Generated migration script from ERD";

/// Format used for the `Generated at` header line
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Render a migration script stamped with `generated_at`
pub fn render_migration(schema: &SynthesizedSchema, generated_at: DateTime<Utc>) -> String {
    let mut sections = vec![format!(
        "{}\n-- Generated at: {}",
        HEADER,
        generated_at.format(TIMESTAMP_FORMAT)
    )];

    let drops: Vec<String> = schema
        .tables
        .iter()
        .rev()
        .chain(schema.junctions.iter())
        .map(drop_table)
        .collect();
    if !drops.is_empty() {
        sections.push(drops.join("\n"));
    }

    sections.extend(create_statements(schema, CreateMode::Plain));

    format!("{}\n", sections.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use erdforge_core::{Cardinality, Entity, ExtractionResult, ExtractionSource, Relationship};
    use erdforge_engine::synthesize;
    use pretty_assertions::assert_eq;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn drop_order_then_create_order() {
        let schema = synthesize(
            &ExtractionResult::new(ExtractionSource::Text, 0.9)
                .with_entities(vec![
                    Entity::new("Student").with_attributes(["full_name"]),
                    Entity::new("Course").with_attributes(["title"]),
                ])
                .with_relationships(vec![Relationship::new(
                    "Student",
                    "Course",
                    Cardinality::ManyToMany,
                )]),
        );

        let expected = "\
-- Generated migration script from ERD
-- Generated at: 2024-05-01 12:30:00 UTC

DROP TABLE IF EXISTS course;
DROP TABLE IF EXISTS student;
DROP TABLE IF EXISTS student_course;

CREATE TABLE student (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    full_name TEXT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NULL
);

CREATE TABLE course (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NULL
);

CREATE TABLE student_course (
    student_id INTEGER NOT NULL,
    course_id INTEGER NOT NULL,
    PRIMARY KEY (student_id, course_id),
    FOREIGN KEY (student_id) REFERENCES student(id),
    FOREIGN KEY (course_id) REFERENCES course(id)
);

CREATE INDEX idx_student_full_name ON student(full_name);
";
        assert_eq!(render_migration(&schema, at()), expected);
    }

    #[test]
    fn empty_schema_keeps_header() {
        let script = render_migration(&SynthesizedSchema::default(), at());
        assert_eq!(
            script,
            "-- Generated migration script from ERD\n-- Generated at: 2024-05-01 12:30:00 UTC\n"
        );
    }
}
