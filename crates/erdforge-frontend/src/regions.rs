//! Region frontend
//!
//! Turns pre-located diagram regions (bounding box plus best-effort recognized
//! text) and detected line segments into the IR. Pixel-level detection happens
//! outside this crate; see [`crate::source`].
//!
//! Recognition failures never fail the run: a region without readable text
//! becomes a placeholder entity and a `DEGRADED_EXTRACTION` diagnostic.

use erdforge_core::{
    BoundingBox, Cardinality, Diagnostic, DiagnosticCode, Entity, ExtractionConfig,
    ExtractionResult, ExtractionSource, Location, Point, Relationship, Severity,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static ENTITY_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("entity name pattern is valid")
});

static KEY_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(PK|FK):\s*(\w+)").expect("key marker pattern is valid")
});

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").expect("identifier pattern is valid"));

/// A candidate text-bearing region reported by the vision collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub bbox: BoundingBox,

    /// Recognized text, one entry per line; `None` when nothing was recognized
    #[serde(default)]
    pub text: Option<String>,
}

impl Region {
    pub fn new(bbox: BoundingBox, text: Option<String>) -> Self {
        Self { bbox, text }
    }
}

/// A detected connector between two points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: Point,
    pub end: Point,
}

impl LineSegment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }
}

/// Builds the IR from detected regions and lines
#[derive(Debug, Clone)]
pub struct RegionExtractor {
    min_width: f64,
    min_height: f64,
    placeholder_attributes: usize,
    confidence: f64,
}

impl RegionExtractor {
    /// Create an extractor with default thresholds
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    /// Create an extractor from extraction settings
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            min_width: config.min_region_width,
            min_height: config.min_region_height,
            placeholder_attributes: config.placeholder_attributes,
            confidence: config.image_confidence,
        }
    }

    /// Extract entities and relationships
    pub fn extract(&self, regions: &[Region], lines: &[LineSegment]) -> ExtractionResult {
        let mut diagnostics = Vec::new();
        let mut entities = Vec::new();

        for region in regions.iter().filter(|r| !self.is_noise(r)) {
            let ordinal = entities.len() + 1;
            entities.push(self.read_region(region, ordinal, &mut diagnostics));
        }

        let discarded = regions.len() - entities.len();
        if discarded > 0 {
            tracing::debug!(discarded, "discarded undersized regions");
        }

        // Reading order: top to bottom, then left to right
        entities.sort_by(|a, b| {
            a.position
                .y
                .total_cmp(&b.position.y)
                .then(a.position.x.total_cmp(&b.position.x))
        });

        let relationships = infer_relationships(&entities, lines);

        tracing::debug!(
            entities = entities.len(),
            relationships = relationships.len(),
            "extracted ERD from regions"
        );

        ExtractionResult::new(ExtractionSource::Regions, self.confidence)
            .with_entities(entities)
            .with_relationships(relationships)
            .with_diagnostics(diagnostics)
    }

    fn is_noise(&self, region: &Region) -> bool {
        region.bbox.width < self.min_width || region.bbox.height < self.min_height
    }

    fn read_region(&self, region: &Region, ordinal: usize, diagnostics: &mut Vec<Diagnostic>) -> Entity {
        let lines: Vec<&str> = region
            .text
            .as_deref()
            .unwrap_or("")
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let name_line = lines.iter().position(|line| ENTITY_NAME.is_match(line));

        let mut attributes = Vec::new();
        let mut primary_keys = Vec::new();
        let mut foreign_keys = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            if Some(i) == name_line {
                continue;
            }

            if let Some(caps) = KEY_MARKER.captures(line) {
                let key = caps[2].to_string();
                if &caps[1] == "PK" {
                    primary_keys.push(key);
                } else {
                    foreign_keys.push(key);
                }
            } else if let Some(m) = IDENTIFIER.find(line) {
                let attr = m.as_str().to_string();
                if !attributes.contains(&attr) {
                    attributes.push(attr);
                }
            } else {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::UnreadableRegionLine,
                        Severity::Info,
                        format!("Skipped unreadable line '{}' in region {}", line, ordinal),
                    ),
                );
            }
        }

        let name = match name_line {
            Some(i) => lines[i].to_string(),
            None => {
                let name = format!("Entity_{}", ordinal);
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::DegradedExtraction,
                        Severity::Info,
                        format!("No entity name recognized in region {}; using placeholder", ordinal),
                    )
                    .with_location(Location::new(name.clone())),
                );
                name
            }
        };

        if attributes.is_empty() && primary_keys.is_empty() && foreign_keys.is_empty() {
            attributes = (0..self.placeholder_attributes).map(|i| format!("attr_{}", i)).collect();
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::DegradedExtraction,
                    Severity::Info,
                    format!("No attributes recognized for '{}'; using placeholders", name),
                )
                .with_location(Location::new(name.clone())),
            );
        }

        Entity::new(name)
            .with_attributes(attributes)
            .with_primary_keys(primary_keys)
            .with_foreign_keys(foreign_keys)
            .with_region(region.bbox)
    }
}

impl Default for RegionExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Index of the entity whose centre is closest to `point`; ties keep the earlier entity
fn nearest_entity(entities: &[Entity], point: &Point) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, entity) in entities.iter().enumerate() {
        let distance = entity.position.distance_squared(point);
        match best {
            Some((_, d)) if d <= distance => {}
            _ => best = Some((i, distance)),
        }
    }
    best.map(|(i, _)| i)
}

/// Connect the entities nearest to each end of every segment
fn infer_relationships(entities: &[Entity], lines: &[LineSegment]) -> Vec<Relationship> {
    let mut relationships: Vec<Relationship> = Vec::new();

    for line in lines {
        let (Some(a), Some(b)) = (
            nearest_entity(entities, &line.start),
            nearest_entity(entities, &line.end),
        ) else {
            continue;
        };

        if a == b {
            continue;
        }

        let (from, to) = (&entities[a].name, &entities[b].name);
        if relationships.iter().any(|r| r.same_pair(from, to)) {
            continue;
        }

        relationships.push(Relationship::new(from.clone(), to.clone(), Cardinality::Unknown));
    }

    relationships
}

/// Extract with default thresholds
pub fn extract_from_regions(regions: &[Region], lines: &[LineSegment]) -> ExtractionResult {
    RegionExtractor::new().extract(regions, lines)
}
