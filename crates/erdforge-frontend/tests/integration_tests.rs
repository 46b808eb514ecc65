//! Integration tests for the text and region frontends

use erdforge_core::{Cardinality, DiagnosticCode, ExtractionConfig, ExtractionSource};
use erdforge_frontend::{
    FrontendError, JsonRegionSource, RegionExtractor, RegionSource, TextParser, extract_from_source,
    extract_from_text, read_text_source,
};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::path::Path;

const BLOG: &str = "Entity: User {id: int, name: str, email: str, PK: id}\n\
                    Entity: Post {id: int, title: str, user_id: int, PK: id, FK: user_id}\n\
                    User -[1:N]-> Post";

#[test]
fn blog_diagram_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", BLOG).unwrap();

    let result = TextParser::new().parse_file(file.path()).unwrap();

    assert_eq!(result.source, ExtractionSource::Text);
    assert_eq!(result.entity_names(), vec!["User", "Post"]);
    assert_eq!(result.entities[0].primary_keys, vec!["id"]);
    assert_eq!(result.entities[1].foreign_keys, vec!["user_id"]);
    assert_eq!(result.relationships[0].cardinality, Cardinality::OneToMany);
}

#[test]
fn text_source_round_trips_file_contents() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "Entity: Tag {{label: str}}").unwrap();

    let text = read_text_source(file.path()).unwrap();
    assert_eq!(extract_from_text(&text).entity_names(), vec!["Tag"]);
}

#[test]
fn missing_text_file_is_fatal() {
    let err = TextParser::new()
        .parse_file(Path::new("/definitely/not/here.erd"))
        .unwrap_err();
    assert!(matches!(err, FrontendError::Input { .. }));
    assert!(err.to_string().contains("/definitely/not/here.erd"));
}

#[test]
fn detector_dump_to_entities_and_relationships() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "regions": [
                {{"bbox": {{"x": 400, "y": 20, "width": 150, "height": 90}}, "text": "Post\nPK: id\ntitle\nFK: user_id"}},
                {{"bbox": {{"x": 20, "y": 20, "width": 150, "height": 90}}, "text": "User\nPK: id\nname\nemail"}},
                {{"bbox": {{"x": 20, "y": 300, "width": 150, "height": 90}}}},
                {{"bbox": {{"x": 900, "y": 900, "width": 5, "height": 5}}, "text": "x"}}
            ],
            "lines": [
                {{"start": {{"x": 170, "y": 65}}, "end": {{"x": 400, "y": 65}}}}
            ]
        }}"#
    )
    .unwrap();

    let result = extract_from_source(&JsonRegionSource, &RegionExtractor::new(), file.path()).unwrap();

    assert_eq!(result.source, ExtractionSource::Regions);
    assert_eq!(result.confidence, 0.8);
    assert_eq!(result.entity_names(), vec!["User", "Post", "Entity_3"]);
    assert_eq!(result.entities[0].attributes, vec!["name", "email"]);
    assert_eq!(result.entities[1].foreign_keys, vec!["user_id"]);

    assert_eq!(result.relationships.len(), 1);
    assert_eq!(result.relationships[0].entity1, "User");
    assert_eq!(result.relationships[0].entity2, "Post");
    assert_eq!(result.relationships[0].cardinality, Cardinality::Unknown);

    let degraded = result
        .diagnostics
        .iter()
        .filter(|d| d.code == DiagnosticCode::DegradedExtraction)
        .count();
    assert_eq!(degraded, 2);
}

#[test]
fn configured_confidences_apply_to_both_frontends() {
    let config = ExtractionConfig {
        text_confidence: 0.5,
        image_confidence: 0.25,
        ..ExtractionConfig::default()
    };

    assert_eq!(TextParser::from_config(&config).parse("").confidence, 0.5);
    assert_eq!(RegionExtractor::from_config(&config).extract(&[], &[]).confidence, 0.25);
}

#[test]
fn region_source_trait_object() {
    let sources: Vec<Box<dyn RegionSource>> = vec![Box::new(JsonRegionSource)];
    assert_eq!(sources[0].name(), "json");
}
