//! Verification of generated SQL
//!
//! Generated scripts are parsed with `sqlparser` (SQLite dialect) and then
//! executed against an in-memory SQLite database, so a script is only
//! accepted when the engine itself accepts it. A script that fails either
//! step is reported instead of being written out.

use rusqlite::Connection;
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;
use std::path::Path;

use crate::error::CodegenError;

/// Parse and execute `script`, returning the number of statements in it
pub fn verify_sql(script: &str) -> Result<usize, CodegenError> {
    let statements = Parser::parse_sql(&SQLiteDialect {}, script)
        .map_err(|e| CodegenError::Verification(e.to_string()))?;

    let conn = Connection::open_in_memory().map_err(verification)?;
    execute(&conn, script)?;

    tracing::debug!(statements = statements.len(), "verified generated SQL");
    Ok(statements.len())
}

/// Execute a DDL script into the SQLite database file at `path`
///
/// The file is created when missing. Existing tables are kept, since the
/// DDL only issues `CREATE ... IF NOT EXISTS`.
pub fn materialize_database(script: &str, path: &Path) -> Result<(), CodegenError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| CodegenError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let conn = Connection::open(path).map_err(verification)?;
    execute(&conn, script)?;

    tracing::debug!("materialized database {}", path.display());
    Ok(())
}

fn execute(conn: &Connection, script: &str) -> Result<(), CodegenError> {
    conn.execute_batch("PRAGMA foreign_keys = ON;").map_err(verification)?;
    conn.execute_batch(script).map_err(verification)
}

fn verification(err: rusqlite::Error) -> CodegenError {
    CodegenError::Verification(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_statements() {
        let script = "-- header\nCREATE TABLE t (\n    id INTEGER PRIMARY KEY AUTOINCREMENT\n);\nCREATE INDEX IF NOT EXISTS idx_t_id ON t(id);\n";
        assert_eq!(verify_sql(script).unwrap(), 2);
    }

    #[test]
    fn empty_script_has_no_statements() {
        assert_eq!(verify_sql("").unwrap(), 0);
    }

    #[test]
    fn garbage_fails() {
        let err = verify_sql("CREATE TABLE (").unwrap_err();
        assert!(matches!(err, CodegenError::Verification(_)));
    }

    #[test]
    fn constraint_between_columns_is_rejected_by_sqlite() {
        let script = "CREATE TABLE post (\n    author_id INTEGER NOT NULL,\n    FOREIGN KEY (author_id) REFERENCES author(id),\n    title TEXT NULL\n);";
        let err = verify_sql(script).unwrap_err();
        assert!(matches!(err, CodegenError::Verification(_)));
    }

    #[test]
    fn unquoted_keyword_table_is_rejected() {
        assert!(verify_sql("CREATE TABLE order (id INTEGER);").is_err());
        assert_eq!(verify_sql("CREATE TABLE \"order\" (id INTEGER);").unwrap(), 1);
    }

    #[test]
    fn database_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/app.db");

        materialize_database("CREATE TABLE IF NOT EXISTS t (id INTEGER PRIMARY KEY);", &path).unwrap();
        // Re-running against the same file is fine
        materialize_database("CREATE TABLE IF NOT EXISTS t (id INTEGER PRIMARY KEY);", &path).unwrap();

        let conn = Connection::open(&path).unwrap();
        let count: i64 = conn
            .query_row("SELECT count(*) FROM sqlite_master WHERE name = 't'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
