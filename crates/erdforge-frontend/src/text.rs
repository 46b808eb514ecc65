//! Text grammar frontend
//!
//! Parses the compact ERD notation:
//!
//! ```text
//! Entity: User {id: int, name: str, email: str, PK: id}
//! Entity: Post {id: int, title: str, user_id: int, PK: id, FK: user_id}
//! User -[1:N]-> Post
//! ```
//!
//! Entity blocks and relationship arrows are matched independently of each
//! other, so text that matches neither is skipped rather than rejected.

use erdforge_core::{
    Cardinality, Entity, ExtractionConfig, ExtractionResult, ExtractionSource, Relationship,
};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::FrontendError;

static ENTITY_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Entity:\s*(\w+)\s*\{([^}]+)\}").expect("entity block pattern is valid")
});

static ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+):\s*\w+").expect("attribute pattern is valid"));

static PRIMARY_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"PK:\s*(\w+)").expect("primary key pattern is valid"));

static FOREIGN_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"FK:\s*(\w+)").expect("foreign key pattern is valid"));

static RELATIONSHIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\w+)\s*-\[([^\]]+)\]->\s*(\w+)").expect("relationship pattern is valid")
});

/// Key markers that are not data attributes
const KEY_MARKERS: [&str; 2] = ["PK", "FK"];

/// Parser for the text ERD notation
#[derive(Debug, Clone)]
pub struct TextParser {
    confidence: f64,
}

impl TextParser {
    /// Create a parser with default settings
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    /// Create a parser from extraction settings
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            confidence: config.text_confidence,
        }
    }

    /// Parse ERD text into the IR
    ///
    /// Never fails: text that matches no entity block or relationship simply
    /// yields an empty result.
    pub fn parse(&self, input: &str) -> ExtractionResult {
        let entities: Vec<Entity> = ENTITY_BLOCK
            .captures_iter(input)
            .map(|caps| parse_entity_block(&caps[1], &caps[2]))
            .collect();

        let relationships: Vec<Relationship> = RELATIONSHIP
            .captures_iter(input)
            .map(|caps| Relationship::new(&caps[1], &caps[3], Cardinality::parse(&caps[2])))
            .collect();

        tracing::debug!(
            entities = entities.len(),
            relationships = relationships.len(),
            "parsed ERD text"
        );

        ExtractionResult::new(ExtractionSource::Text, self.confidence)
            .with_entities(entities)
            .with_relationships(relationships)
    }

    /// Read and parse an ERD text file
    pub fn parse_file(&self, path: &Path) -> Result<ExtractionResult, FrontendError> {
        let text = read_text_source(path)?;
        Ok(self.parse(&text))
    }
}

impl Default for TextParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_entity_block(name: &str, body: &str) -> Entity {
    let attributes = ATTRIBUTE
        .captures_iter(body)
        .map(|caps| caps[1].to_string())
        .filter(|attr| !KEY_MARKERS.contains(&attr.as_str()));

    let primary_keys = PRIMARY_KEY.captures_iter(body).map(|caps| caps[1].to_string());
    let foreign_keys = FOREIGN_KEY.captures_iter(body).map(|caps| caps[1].to_string());

    Entity::new(name)
        .with_attributes(attributes)
        .with_primary_keys(primary_keys)
        .with_foreign_keys(foreign_keys)
}

/// Read an ERD text source; an unreadable file is the only failure
pub fn read_text_source(path: &Path) -> Result<String, FrontendError> {
    std::fs::read_to_string(path).map_err(|e| FrontendError::input(path, e))
}

/// Parse ERD text with default settings
pub fn extract_from_text(input: &str) -> ExtractionResult {
    TextParser::new().parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use erdforge_core::RelationshipKind;

    const BLOG: &str = "Entity: User {id: int, name: str, email: str, PK: id}\n\
                        Entity: Post {id: int, title: str, user_id: int, PK: id, FK: user_id}\n\
                        User -[1:N]-> Post";

    #[test]
    fn parses_entities_and_keys() {
        let result = extract_from_text(BLOG);

        assert_eq!(result.entities.len(), 2);
        assert_eq!(result.relationships.len(), 1);

        let user = &result.entities[0];
        assert_eq!(user.name, "User");
        assert_eq!(user.attributes, vec!["id", "name", "email"]);
        assert_eq!(user.primary_keys, vec!["id"]);
        assert!(user.foreign_keys.is_empty());

        let post = &result.entities[1];
        assert_eq!(post.attributes, vec!["id", "title", "user_id"]);
        assert_eq!(post.foreign_keys, vec!["user_id"]);
    }

    #[test]
    fn relationship_tokens() {
        let result = extract_from_text(BLOG);
        let rel = &result.relationships[0];

        assert_eq!(rel.entity1, "User");
        assert_eq!(rel.entity2, "Post");
        assert_eq!(rel.cardinality, Cardinality::OneToMany);
        assert_eq!(rel.relationship_type, RelationshipKind::NonIdentifying);
    }

    #[test]
    fn empty_input_reports_fixed_confidence() {
        let result = extract_from_text("");
        assert!(result.entities.is_empty());
        assert!(result.relationships.is_empty());
        assert_eq!(result.confidence, 0.9);
        assert_eq!(result.source, ExtractionSource::Text);
    }

    #[test]
    fn missing_pk_token_leaves_keys_empty() {
        let result = extract_from_text("Entity: Category {id: int, name: str}");
        let category = &result.entities[0];
        assert_eq!(category.attributes, vec!["id", "name"]);
        assert!(category.primary_keys.is_empty());
    }

    #[test]
    fn malformed_blocks_are_skipped() {
        let result = extract_from_text(
            "Entity: Broken {id: int\nEntity: Tag {label: str}\nnonsense -> here",
        );
        // The unclosed block swallows text up to the next closing brace
        assert_eq!(result.entities.len(), 1);
        assert!(result.relationships.is_empty());
    }

    #[test]
    fn unknown_cardinality_is_kept_as_unknown() {
        let result = extract_from_text("A -[many]-> B\nStudent -[N:M]-> Course");
        assert_eq!(result.relationships[0].cardinality, Cardinality::Unknown);
        assert_eq!(result.relationships[1].cardinality, Cardinality::ManyToMany);
    }

    #[test]
    fn confidence_follows_config() {
        let config = ExtractionConfig {
            text_confidence: 0.5,
            ..ExtractionConfig::default()
        };
        let result = TextParser::from_config(&config).parse("");
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn unreadable_file_is_an_input_error() {
        let err = TextParser::new()
            .parse_file(Path::new("/definitely/not/here.erd"))
            .unwrap_err();
        assert!(matches!(err, FrontendError::Input { .. }));
    }
}
