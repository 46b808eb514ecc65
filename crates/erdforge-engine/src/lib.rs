//! erdforge engine - schema derivation
//!
//! This crate implements the logic between extraction and code generation:
//! - Type and key inference from attribute names
//! - Schema synthesis (tables, junction tables, foreign keys, indexes)

pub mod inference;
pub mod synthesizer;

pub use inference::{
    KeyRole, ddl_nullable, infer_key_role, infer_type, is_index_candidate, model_optional,
    referenced_entity,
};
pub use synthesizer::{AUDIT_COLUMNS, SURROGATE_KEY, SchemaSynthesizer, synthesize};
