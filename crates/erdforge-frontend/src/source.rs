//! Boundary with the vision collaborator
//!
//! Detectors run outside this crate and hand over regions and line segments.
//! A [`RegionSource`] is anything that can produce that hand-over for a given
//! input path; [`JsonRegionSource`] reads a detector's JSON dump:
//!
//! ```json
//! {
//!   "regions": [{"bbox": {"x": 10, "y": 10, "width": 120, "height": 80}, "text": "User\nPK: id"}],
//!   "lines": [{"start": {"x": 130, "y": 50}, "end": {"x": 300, "y": 50}}]
//! }
//! ```

use erdforge_core::ExtractionResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::FrontendError;
use crate::regions::{LineSegment, Region, RegionExtractor};

/// Everything a detector found in one image
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegionScan {
    #[serde(default)]
    pub regions: Vec<Region>,

    #[serde(default)]
    pub lines: Vec<LineSegment>,
}

/// Trait for collaborators that locate regions and lines in an image
pub trait RegionSource: Send + Sync {
    /// Source name, for logs
    fn name(&self) -> &'static str;

    /// Scan an input; an unreadable input is a fatal error
    fn scan(&self, path: &Path) -> Result<RegionScan, FrontendError>;
}

/// Reads detector output stored as JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRegionSource;

impl RegionSource for JsonRegionSource {
    fn name(&self) -> &'static str {
        "json"
    }

    fn scan(&self, path: &Path) -> Result<RegionScan, FrontendError> {
        let contents = std::fs::read_to_string(path).map_err(|e| FrontendError::input(path, e))?;

        serde_json::from_str(&contents).map_err(|e| FrontendError::InvalidRegions {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Scan `path` with `source` and extract the IR
///
/// Scan failures stop the run; recognition gaps inside the scan do not.
pub fn extract_from_source(
    source: &dyn RegionSource,
    extractor: &RegionExtractor,
    path: &Path,
) -> Result<ExtractionResult, FrontendError> {
    let scan = source.scan(path)?;

    tracing::debug!(
        source = source.name(),
        regions = scan.regions.len(),
        lines = scan.lines.len(),
        "scanned {}",
        path.display()
    );

    Ok(extractor.extract(&scan.regions, &scan.lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_detector_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"regions": [{{"bbox": {{"x": 0, "y": 0, "width": 100, "height": 50}}, "text": "User\nname"}},
                             {{"bbox": {{"x": 0, "y": 100, "width": 100, "height": 50}}}}],
                "lines": []}}"#
        )
        .unwrap();

        let scan = JsonRegionSource.scan(file.path()).unwrap();
        assert_eq!(scan.regions.len(), 2);
        assert!(scan.regions[1].text.is_none());

        let result = extract_from_source(&JsonRegionSource, &RegionExtractor::new(), file.path()).unwrap();
        assert_eq!(result.entity_names(), vec!["User", "Entity_2"]);
    }

    #[test]
    fn missing_file_is_input_error() {
        let err = JsonRegionSource.scan(Path::new("/no/such/scan.json")).unwrap_err();
        assert!(matches!(err, FrontendError::Input { .. }));
    }

    #[test]
    fn garbage_is_invalid_regions() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = JsonRegionSource.scan(file.path()).unwrap_err();
        assert!(matches!(err, FrontendError::InvalidRegions { .. }));
    }
}
