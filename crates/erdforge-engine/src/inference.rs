//! Type & key inference from attribute names
//!
//! Types come from an ordered rule table evaluated top-down with
//! case-insensitive substring containment. The first matching rule wins, which
//! means names can over-match (`guide` hits the `id` rule). Callers depend on
//! that exact behaviour, so keep it substring based.

use erdforge_core::{Column, ColumnRole, Entity, SemanticType};
use serde::{Deserialize, Serialize};

/// One row of the type rule table
#[derive(Debug, Clone, Copy)]
pub struct TypeRule {
    pub keywords: &'static [&'static str],
    pub semantic_type: SemanticType,
}

impl TypeRule {
    /// True when any keyword occurs in the (already lower-cased) name
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k))
    }
}

/// Ordered type rules; anything unmatched is text
pub const TYPE_RULES: &[TypeRule] = &[
    TypeRule {
        keywords: &["id", "count", "num", "quantity"],
        semantic_type: SemanticType::Integer,
    },
    TypeRule {
        keywords: &["price", "amount", "rate", "percent"],
        semantic_type: SemanticType::Real,
    },
    TypeRule {
        keywords: &["date", "time", "created", "updated"],
        semantic_type: SemanticType::Timestamp,
    },
    TypeRule {
        keywords: &["is_", "has_", "can_", "flag"],
        semantic_type: SemanticType::Boolean,
    },
];

/// Attribute name fragments that earn a secondary index
pub const INDEX_KEYWORDS: &[&str] = &["name", "email", "code", "status"];

/// Infer the semantic type of an attribute from its name
pub fn infer_type(name: &str) -> SemanticType {
    let lowered = name.to_lowercase();
    TYPE_RULES
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map(|rule| rule.semantic_type)
        .unwrap_or(SemanticType::Text)
}

/// True when an attribute should get its own index
pub fn is_index_candidate(name: &str) -> bool {
    let lowered = name.to_lowercase();
    INDEX_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// Key role of an attribute within its entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyRole {
    Primary,
    Foreign,
    None,
}

/// Decide the key role of an attribute; a primary key wins over a foreign key
pub fn infer_key_role(entity: &Entity, attr: &str) -> KeyRole {
    if entity.is_primary_key(attr) {
        KeyRole::Primary
    } else if entity.is_foreign_key(attr) {
        KeyRole::Foreign
    } else {
        KeyRole::None
    }
}

/// Whether the column may hold NULL in generated DDL
///
/// Only primary keys and foreign keys are NOT NULL.
pub fn ddl_nullable(entity: &Entity, attr: &str) -> bool {
    infer_key_role(entity, attr) == KeyRole::None
}

/// Whether a column is optional in generated model source
///
/// Model code stays permissive: everything except a declared primary key is
/// optional, foreign keys and the surrogate `id` included. Audit columns
/// follow their DDL nullability.
pub fn model_optional(column: &Column) -> bool {
    match column.role {
        ColumnRole::PrimaryKey => false,
        ColumnRole::Audit => column.nullable,
        ColumnRole::SurrogateKey | ColumnRole::ForeignKey | ColumnRole::Attribute => true,
    }
}

/// Guess the entity a foreign key points at (`user_id` -> `user`, `authorId` -> `author`)
pub fn referenced_entity(fk: &str) -> String {
    let stripped = fk.replace("_id", "").replace("Id", "");
    if stripped.is_empty() {
        fk.to_string()
    } else {
        stripped
    }
}
