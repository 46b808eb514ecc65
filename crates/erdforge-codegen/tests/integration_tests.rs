//! End-to-end generation tests: text in, artifacts out

use chrono::{TimeZone, Utc};
use erdforge_codegen::{
    CodeGenerator, CodegenError, generate_ddl, generate_migration, generate_migration_at,
    generate_models, verify_sql, write_database, write_ddl, write_migration, write_models,
};
use erdforge_core::{ExtractionSource, ModelTarget};
use erdforge_engine::synthesize;
use erdforge_frontend::extract_from_text;
use pretty_assertions::assert_eq;
use rusqlite::Connection;

const BLOG: &str = "Entity: User {id: int, name: str, email: str, PK: id}
Entity: Post {id: int, title: str, user_id: int, PK: id, FK: user_id}
User -[1:N]-> Post";

const SCHOOL: &str = "\
Entity: Category {id: int, name: str}
Entity: Product {id: int, title: str, category_id: int, PK: id, FK: category_id}
Entity: Student {id: int, full_name: str, enrollment_date: datetime, PK: id}
Entity: Course {id: int, code: str, credit_count: int, PK: id}
Category -[1:N]-> Product
Student -[N:M]-> Course
";

#[test]
fn implicit_primary_key_in_ddl() {
    let result = extract_from_text("Entity: Category {id: int, name: str}");
    let ddl = generate_ddl(&result).unwrap();

    assert!(ddl.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
    assert_eq!(ddl.matches("CREATE TABLE").count(), 1);
}

#[test]
fn junction_only_for_many_to_many() {
    let ddl = generate_ddl(&extract_from_text(SCHOOL)).unwrap();

    assert!(ddl.contains("CREATE TABLE IF NOT EXISTS student_course ("));
    assert!(ddl.contains("PRIMARY KEY (student_id, course_id)"));
    assert!(!ddl.contains("category_product"));
}

#[test]
fn ddl_is_idempotent() {
    let result = extract_from_text(SCHOOL);
    assert_eq!(generate_ddl(&result).unwrap(), generate_ddl(&result).unwrap());
}

#[test]
fn generated_sql_parses_back() {
    let result = extract_from_text(SCHOOL);
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    // 5 tables + 4 indexes
    assert_eq!(verify_sql(&generate_ddl(&result).unwrap()).unwrap(), 9);
    // 5 drops + 5 tables + 4 indexes
    assert_eq!(verify_sql(&generate_migration_at(&result, at).unwrap()).unwrap(), 14);
}

#[test]
fn verification_can_run_inside_the_generator() {
    let schema = synthesize(&extract_from_text(SCHOOL));
    let generator = CodeGenerator::new().with_verification(true);

    assert!(generator.ddl(&schema).is_ok());
    assert!(generator.migration(&schema).is_ok());
}

/// Open an in-memory database with foreign keys enforced and run `script`
fn execute(script: &str) -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
    conn.execute_batch(script).unwrap();
    conn
}

#[test]
fn blog_ddl_runs_on_sqlite_and_enforces_references() {
    let result = extract_from_text(BLOG);
    let conn = execute(&generate_ddl(&result).unwrap());

    conn.execute("INSERT INTO user (name, email) VALUES ('ann', 'ann@example.com')", [])
        .unwrap();
    conn.execute("INSERT INTO post (title, user_id) VALUES ('hello', 1)", []).unwrap();
    assert!(conn
        .execute("INSERT INTO post (title, user_id) VALUES ('orphan', 42)", [])
        .is_err());

    let created_at: Option<String> = conn
        .query_row("SELECT created_at FROM post WHERE id = 1", [], |row| row.get(0))
        .unwrap();
    assert!(created_at.is_some());
}

#[test]
fn blog_migration_runs_on_sqlite_twice() {
    let script = generate_migration(&extract_from_text(BLOG)).unwrap();
    let conn = execute(&script);
    // Drops make the script re-runnable
    conn.execute_batch(&script).unwrap();
}

#[test]
fn school_scripts_run_on_sqlite() {
    let result = extract_from_text(SCHOOL);
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    execute(&generate_ddl(&result).unwrap());
    let conn = execute(&generate_migration_at(&result, at).unwrap());

    conn.execute("INSERT INTO student (full_name) VALUES ('ann')", []).unwrap();
    conn.execute("INSERT INTO course (code) VALUES ('CS101')", []).unwrap();
    conn.execute("INSERT INTO student_course (student_id, course_id) VALUES (1, 1)", [])
        .unwrap();
    assert!(conn
        .execute("INSERT INTO student_course (student_id, course_id) VALUES (1, 1)", [])
        .is_err());
}

#[test]
fn reserved_word_entities_run_on_sqlite() {
    let result = extract_from_text(
        "Entity: Order {id: int, status: str, PK: id}\n\
         Entity: Group {id: int, title: str, order_id: int, PK: id, FK: order_id}\n\
         Order -[N:M]-> Group",
    );
    let generator = CodeGenerator::new().with_verification(true);
    let schema = synthesize(&result);

    let ddl = generator.ddl(&schema).unwrap();
    assert!(ddl.contains("CREATE TABLE IF NOT EXISTS \"order\" ("));

    let conn = execute(&ddl);
    conn.execute("INSERT INTO \"order\" (status) VALUES ('open')", []).unwrap();
    conn.execute("INSERT INTO \"group\" (title, order_id) VALUES ('a', 1)", []).unwrap();
    conn.execute("INSERT INTO order_group (order_id, group_id) VALUES (1, 1)", []).unwrap();

    execute(&generator.migration(&schema).unwrap());
}

#[test]
fn composite_key_target_blocks_sql() {
    let result = extract_from_text(
        "Entity: Enrollment {student_no: int, course_code: str, PK: student_no, PK: course_code}\n\
         Entity: Grade {score: int, enrollment_id: int, FK: enrollment_id}",
    );

    let err = generate_ddl(&result).unwrap_err();
    assert!(matches!(err, CodegenError::DanglingReference { ref dangling } if dangling.len() == 1));
    assert!(generate_models(&result).contains("class Grade"));
}

#[test]
fn database_file_holds_every_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db/school.db");

    write_database(&extract_from_text(SCHOOL), &path).unwrap();

    let conn = Connection::open(&path).unwrap();
    let tables: i64 = conn
        .query_row(
            "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(tables, 5);
}

#[test]
fn migration_orders_drops_and_creates() {
    let result = extract_from_text(SCHOOL);
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let script = generate_migration_at(&result, at).unwrap();

    let position = |needle: &str| script.find(needle).unwrap();

    assert!(script.starts_with("-- Generated migration script from ERD\n-- Generated at: 2024-01-01 00:00:00 UTC\n"));
    assert!(position("DROP TABLE IF EXISTS course;") < position("DROP TABLE IF EXISTS student;"));
    assert!(position("DROP TABLE IF EXISTS category;") < position("DROP TABLE IF EXISTS student_course;"));
    assert!(position("DROP TABLE IF EXISTS student_course;") < position("CREATE TABLE category ("));
    assert!(position("CREATE TABLE category (") < position("CREATE TABLE product ("));
    assert!(position("CREATE TABLE course (") < position("CREATE TABLE student_course ("));
}

#[test]
fn models_for_every_table() {
    let models = generate_models(&extract_from_text(SCHOOL));

    for class in ["Category", "Product", "Student", "Course", "StudentCourse"] {
        assert!(models.contains(&format!("class {}(SQLModel, table=True):", class)), "{}", class);
    }
    assert!(models.contains("    category: Optional[\"Category\"] = Relationship()"));
    assert!(models.contains("    enrollment_date: Optional[datetime] = None"));
    assert!(models.contains("    credit_count: Optional[int] = None"));
}

#[test]
fn rust_models_from_text() {
    let schema = synthesize(&extract_from_text(SCHOOL));
    let models = CodeGenerator::new().with_target(ModelTarget::Rust).models(&schema);

    assert!(models.contains("pub struct StudentCourse {"));
    assert!(models.contains("    pub enrollment_date: Option<NaiveDateTime>,"));
}

#[test]
fn dangling_key_blocks_sql_but_not_models() {
    let result = extract_from_text("Entity: Post {title: str, author_id: int, FK: author_id}");
    assert_eq!(result.source, ExtractionSource::Text);

    assert!(matches!(generate_ddl(&result), Err(CodegenError::DanglingReference { .. })));
    assert!(generate_models(&result).contains("class Post"));
}

#[test]
fn write_twins_create_files() {
    let dir = tempfile::tempdir().unwrap();
    let result = extract_from_text(SCHOOL);

    let ddl_path = dir.path().join("out/schema.sql");
    let migration_path = dir.path().join("out/migration.sql");
    let models_path = dir.path().join("models.py");

    write_ddl(&result, &ddl_path).unwrap();
    write_migration(&result, &migration_path).unwrap();
    write_models(&result, &models_path).unwrap();

    assert_eq!(std::fs::read_to_string(&ddl_path).unwrap(), generate_ddl(&result).unwrap());
    assert!(std::fs::read_to_string(&migration_path)
        .unwrap()
        .contains("DROP TABLE IF EXISTS student_course;"));
    assert_eq!(std::fs::read_to_string(&models_path).unwrap(), generate_models(&result));
}

#[test]
fn write_into_a_file_path_fails_with_io() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let bad = file.path().join("nested.sql");

    let err = write_ddl(&extract_from_text(SCHOOL), &bad).unwrap_err();
    assert!(matches!(err, CodegenError::Io { .. }));
}
