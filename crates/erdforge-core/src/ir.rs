//! Intermediate representation shared by every pipeline stage
//!
//! Frontends build these values once per extraction run; the synthesizer and
//! generators only read them.

use serde::{Deserialize, Serialize};
use crate::diagnostic::Diagnostic;

/// A point in image coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The origin, used by frontends without geometry
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    /// Squared Euclidean distance to another point
    pub fn distance_squared(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Axis-aligned bounding box of a detected region
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Centre point of the box
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// A named relation candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Entity name as written in the source (not guaranteed unique)
    pub name: String,

    /// Ordered attribute names
    pub attributes: Vec<String>,

    /// Declared primary key names (set semantics, declaration order)
    pub primary_keys: Vec<String>,

    /// Declared foreign key names (set semantics, declaration order)
    pub foreign_keys: Vec<String>,

    /// Position in the diagram; the origin for text input
    pub position: Point,

    /// Region the entity was recognized in (image input only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

impl Entity {
    /// Create an entity with no attributes or keys at the origin
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            primary_keys: Vec::new(),
            foreign_keys: Vec::new(),
            position: Point::ORIGIN,
            bounding_box: None,
        }
    }

    /// Set attributes
    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    /// Set primary keys, dropping repeats
    pub fn with_primary_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_keys = dedup(keys);
        self
    }

    /// Set foreign keys, dropping repeats
    pub fn with_foreign_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.foreign_keys = dedup(keys);
        self
    }

    /// Place the entity on a detected region; position becomes the region centre
    pub fn with_region(mut self, bbox: BoundingBox) -> Self {
        self.position = bbox.center();
        self.bounding_box = Some(bbox);
        self
    }

    pub fn is_primary_key(&self, name: &str) -> bool {
        self.primary_keys.iter().any(|k| k == name)
    }

    pub fn is_foreign_key(&self, name: &str) -> bool {
        self.foreign_keys.iter().any(|k| k == name)
    }

    /// Table name derived from the entity name
    pub fn table_name(&self) -> String {
        self.name.to_lowercase()
    }
}

fn dedup<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let item = item.into();
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Relationship cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    #[serde(rename = "1:1")]
    OneToOne,

    #[serde(rename = "1:N")]
    OneToMany,

    #[serde(rename = "N:M")]
    ManyToMany,

    /// Geometry alone cannot tell cardinality
    #[serde(rename = "unknown")]
    Unknown,
}

impl Cardinality {
    /// Parse cardinality notation; anything unrecognized is `Unknown`
    pub fn parse(text: &str) -> Self {
        match text.trim().to_ascii_uppercase().as_str() {
            "1:1" => Self::OneToOne,
            "1:N" => Self::OneToMany,
            "N:M" => Self::ManyToMany,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneToOne => "1:1",
            Self::OneToMany => "1:N",
            Self::ManyToMany => "N:M",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether the child's identity depends on the parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipKind {
    Identifying,
    NonIdentifying,
}

impl std::fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identifying => write!(f, "identifying"),
            Self::NonIdentifying => write!(f, "non-identifying"),
        }
    }
}

/// An edge between two entity names
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relationship {
    /// First endpoint; order matters for junction table naming
    pub entity1: String,

    /// Second endpoint
    pub entity2: String,

    pub cardinality: Cardinality,

    pub relationship_type: RelationshipKind,
}

impl Relationship {
    /// Create a non-identifying relationship
    pub fn new(
        entity1: impl Into<String>,
        entity2: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            entity1: entity1.into(),
            entity2: entity2.into(),
            cardinality,
            relationship_type: RelationshipKind::NonIdentifying,
        }
    }

    /// Set relationship type
    pub fn with_kind(mut self, kind: RelationshipKind) -> Self {
        self.relationship_type = kind;
        self
    }

    /// True when both endpoints name the same entity pair, in either order
    pub fn same_pair(&self, a: &str, b: &str) -> bool {
        (self.entity1 == a && self.entity2 == b) || (self.entity1 == b && self.entity2 == a)
    }
}

/// Which frontend produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionSource {
    Text,
    Regions,
}

/// The IR handed from a frontend to the synthesizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub entities: Vec<Entity>,

    pub relationships: Vec<Relationship>,

    /// Frontend self-reported quality signal in [0, 1]
    pub confidence: f64,

    pub source: ExtractionSource,

    /// Non-fatal conditions met while extracting
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl ExtractionResult {
    /// Create an empty result
    pub fn new(source: ExtractionSource, confidence: f64) -> Self {
        Self {
            entities: Vec::new(),
            relationships: Vec::new(),
            confidence: confidence.clamp(0.0, 1.0),
            source,
            diagnostics: Vec::new(),
        }
    }

    /// Set entities
    pub fn with_entities(mut self, entities: Vec<Entity>) -> Self {
        self.entities = entities;
        self
    }

    /// Set relationships
    pub fn with_relationships(mut self, relationships: Vec<Relationship>) -> Self {
        self.relationships = relationships;
        self
    }

    /// Set diagnostics
    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Find the first entity with the given name
    pub fn find_entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn entity_names(&self) -> Vec<&str> {
        self.entities.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty()
    }
}
