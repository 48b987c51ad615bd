use std::fs;
use std::path::Path;

use image::RgbaImage;
use symbol_scan_types::TextRegion;

use crate::{DetectionError, RegionDetector, validate_regions};

/// Serves a fixed, previously recorded set of regions for every image.
///
/// The JSON document is an array of regions, each with a `characters` array of
/// quads whose corners are `{ "x": .., "y": .. }` in unit coordinates.
#[derive(Debug, Clone, Default)]
pub struct ReplayDetector {
    regions: Vec<TextRegion>,
}

impl ReplayDetector {
    pub fn new(regions: Vec<TextRegion>) -> Self {
        Self { regions }
    }

    pub fn from_path(path: &Path) -> Result<Self, DetectionError> {
        let contents = fs::read_to_string(path).map_err(|source| DetectionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let regions: Vec<TextRegion> =
            serde_json::from_str(&contents).map_err(|err| DetectionError::Parse {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        validate_regions(&regions)?;
        Ok(Self { regions })
    }

    pub fn regions(&self) -> &[TextRegion] {
        &self.regions
    }
}

impl RegionDetector for ReplayDetector {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn detect(&self, image: &RgbaImage) -> Result<Vec<TextRegion>, DetectionError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(DetectionError::EmptyImage);
        }
        validate_regions(&self.regions)?;
        Ok(self.regions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use symbol_scan_types::Point;

    const TWO_REGIONS: &str = r#"[
        {"characters": [
            {"top_left": {"x": 0.1, "y": 0.2}, "top_right": {"x": 0.2, "y": 0.2},
             "bottom_left": {"x": 0.1, "y": 0.4}, "bottom_right": {"x": 0.2, "y": 0.4}}
        ]},
        {}
    ]"#;

    #[test]
    fn loads_regions_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TWO_REGIONS.as_bytes()).unwrap();

        let detector = ReplayDetector::from_path(file.path()).unwrap();
        let regions = detector.regions();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].characters.len(), 1);
        assert_eq!(regions[0].characters[0].top_right, Point::new(0.2, 0.2));
        assert!(regions[1].characters.is_empty());
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"characters\": 3}").unwrap();

        let err = ReplayDetector::from_path(file.path()).unwrap_err();
        assert!(matches!(err, DetectionError::Parse { .. }));
    }

    #[test]
    fn empty_image_is_rejected() {
        let detector = ReplayDetector::default();
        let err = detector.detect(&RgbaImage::new(0, 10)).unwrap_err();
        assert!(matches!(err, DetectionError::EmptyImage));
        assert!(detector.detect(&RgbaImage::new(4, 4)).unwrap().is_empty());
    }
}
