//! ERD frontends
//!
//! This crate handles:
//! - Parsing the text ERD notation
//! - Building entities and relationships from detected diagram regions
//! - Reading detector output handed over by the vision collaborator
//!
//! Both frontends produce the same [`erdforge_core::ExtractionResult`].

pub mod error;
pub mod text;
pub mod regions;
pub mod source;

pub use error::FrontendError;
pub use text::{TextParser, extract_from_text, read_text_source};
pub use regions::{LineSegment, Region, RegionExtractor, extract_from_regions};
pub use source::{JsonRegionSource, RegionScan, RegionSource, extract_from_source};
