//! erdforge code generators
//!
//! Turns a synthesized schema into artifacts:
//! - SQL DDL
//! - a drop/create migration script
//! - ORM model source (SQLModel or Rust)
//! - a SQLite database file built from the DDL
//!
//! Every generator is a pure function of the schema. The `write_*` functions
//! and [`materialize_database`] are the only places artifacts touch the
//! filesystem.

pub mod error;
pub mod naming;
pub mod ddl;
pub mod migration;
pub mod orm;
pub mod verify;

pub use error::CodegenError;
pub use ddl::render_ddl;
pub use migration::render_migration;
pub use naming::{python_field, sql_ident, to_pascal_case};
pub use orm::{ModelDialect, RustDialect, SqlModelDialect, dialect_for, render_models};
pub use verify::{materialize_database, verify_sql};

use chrono::{DateTime, Utc};
use erdforge_core::{ExtractionResult, GenerationConfig, ModelTarget, SynthesizedSchema};
use erdforge_engine::synthesize;
use std::path::Path;

/// Artifact generator with its generation settings
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    strict_references: bool,
    verify_sql: bool,
    target: ModelTarget,
}

impl CodeGenerator {
    /// Strict references, no verification, SQLModel output
    pub fn new() -> Self {
        Self::from_config(&GenerationConfig::default())
    }

    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            strict_references: config.strict_references,
            verify_sql: config.verify_sql,
            target: config.model_target,
        }
    }

    pub fn with_strict_references(mut self, strict: bool) -> Self {
        self.strict_references = strict;
        self
    }

    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify_sql = verify;
        self
    }

    pub fn with_target(mut self, target: ModelTarget) -> Self {
        self.target = target;
        self
    }

    pub fn target(&self) -> ModelTarget {
        self.target
    }

    /// Render the DDL script
    pub fn ddl(&self, schema: &SynthesizedSchema) -> Result<String, CodegenError> {
        self.check_references(schema)?;
        let script = render_ddl(schema);
        self.verify(&script)?;
        Ok(script)
    }

    /// Render a migration script stamped with the current time
    pub fn migration(&self, schema: &SynthesizedSchema) -> Result<String, CodegenError> {
        self.migration_at(schema, Utc::now())
    }

    /// Render a migration script stamped with `generated_at`
    pub fn migration_at(
        &self,
        schema: &SynthesizedSchema,
        generated_at: DateTime<Utc>,
    ) -> Result<String, CodegenError> {
        self.check_references(schema)?;
        let script = render_migration(schema, generated_at);
        self.verify(&script)?;
        Ok(script)
    }

    /// Render the DDL and execute it into the SQLite database at `path`
    ///
    /// Returns the executed script.
    pub fn database(&self, schema: &SynthesizedSchema, path: &Path) -> Result<String, CodegenError> {
        let script = self.ddl(schema)?;
        materialize_database(&script, path)?;
        Ok(script)
    }

    /// Render model source in the configured target
    pub fn models(&self, schema: &SynthesizedSchema) -> String {
        render_models(schema, self.target)
    }

    fn check_references(&self, schema: &SynthesizedSchema) -> Result<(), CodegenError> {
        if !self.strict_references {
            return Ok(());
        }

        let dangling = schema.validate_references();
        if dangling.is_empty() {
            Ok(())
        } else {
            Err(CodegenError::DanglingReference { dangling })
        }
    }

    fn verify(&self, script: &str) -> Result<(), CodegenError> {
        if self.verify_sql {
            verify_sql(script)?;
        }
        Ok(())
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate DDL for an extraction result with default settings
pub fn generate_ddl(result: &ExtractionResult) -> Result<String, CodegenError> {
    CodeGenerator::new().ddl(&synthesize(result))
}

/// Generate a migration script with default settings
pub fn generate_migration(result: &ExtractionResult) -> Result<String, CodegenError> {
    CodeGenerator::new().migration(&synthesize(result))
}

/// Generate a migration script with a fixed timestamp
pub fn generate_migration_at(
    result: &ExtractionResult,
    generated_at: DateTime<Utc>,
) -> Result<String, CodegenError> {
    CodeGenerator::new().migration_at(&synthesize(result), generated_at)
}

/// Generate SQLModel source with default settings
pub fn generate_models(result: &ExtractionResult) -> String {
    CodeGenerator::new().models(&synthesize(result))
}

/// Write an artifact, creating parent directories
pub fn write_artifact(path: &Path, contents: &str) -> Result<(), CodegenError> {
    let io = |source| CodegenError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io)?;
    }
    std::fs::write(path, contents).map_err(io)?;

    tracing::debug!(bytes = contents.len(), "wrote {}", path.display());
    Ok(())
}

pub fn write_ddl(result: &ExtractionResult, path: &Path) -> Result<(), CodegenError> {
    write_artifact(path, &generate_ddl(result)?)
}

pub fn write_migration(result: &ExtractionResult, path: &Path) -> Result<(), CodegenError> {
    write_artifact(path, &generate_migration(result)?)
}

pub fn write_models(result: &ExtractionResult, path: &Path) -> Result<(), CodegenError> {
    write_artifact(path, &generate_models(result))
}

/// Build a SQLite database file from the generated DDL
pub fn write_database(result: &ExtractionResult, path: &Path) -> Result<(), CodegenError> {
    CodeGenerator::new().database(&synthesize(result), path).map(|_| ())
}
