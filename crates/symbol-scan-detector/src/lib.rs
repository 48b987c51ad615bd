//! Text-region detectors reporting per-character boxes.
//!
//! Every backend implements [`RegionDetector`]; [`build_detector`] picks one
//! by [`DetectorKind`] and falls back through the platform priority list when
//! asked for [`DetectorKind::Auto`].

use std::path::PathBuf;
use std::str::FromStr;

use image::RgbaImage;
use symbol_scan_types::TextRegion;

mod backends;
mod error;

pub use backends::replay::ReplayDetector;
#[cfg(all(feature = "detector-vision", target_os = "macos"))]
pub use backends::vision::VisionTextDetector;
pub use error::DetectionError;

#[cfg(target_os = "macos")]
const AUTO_DETECTOR_PRIORITY: &[DetectorKind] = &[DetectorKind::MacVision, DetectorKind::Replay];

#[cfg(not(target_os = "macos"))]
const AUTO_DETECTOR_PRIORITY: &[DetectorKind] = &[DetectorKind::Replay];

/// Finds text regions and their character boxes in a full image.
pub trait RegionDetector: Send + Sync {
    fn name(&self) -> &'static str;

    fn detect(&self, image: &RgbaImage) -> Result<Vec<TextRegion>, DetectionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorKind {
    Auto,
    MacVision,
    Replay,
}

impl DetectorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DetectorKind::Auto => "auto",
            DetectorKind::MacVision => "vision",
            DetectorKind::Replay => "replay",
        }
    }

    /// Kinds that can be built in this binary, `Auto` excluded.
    pub fn available() -> Vec<DetectorKind> {
        [DetectorKind::MacVision, DetectorKind::Replay]
            .into_iter()
            .filter(|kind| backend_for_kind(*kind).is_some())
            .collect()
    }
}

impl FromStr for DetectorKind {
    type Err = DetectionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(DetectorKind::Auto),
            "vision" | "macos-vision" => Ok(DetectorKind::MacVision),
            "replay" => Ok(DetectorKind::Replay),
            _ => Err(DetectionError::UnknownBackend(value.trim().to_string())),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DetectorConfig {
    /// JSON file with recorded regions, used by the replay backend.
    pub replay_path: Option<PathBuf>,
}

trait DetectorBackend: Sync {
    fn kind(&self) -> DetectorKind;
    fn ensure_available(&self, config: &DetectorConfig) -> Result<(), DetectionError>;
    fn build(&self, config: &DetectorConfig) -> Result<Box<dyn RegionDetector>, DetectionError>;
}

#[cfg(all(feature = "detector-vision", target_os = "macos"))]
struct VisionBackend;

#[cfg(all(feature = "detector-vision", target_os = "macos"))]
impl DetectorBackend for VisionBackend {
    fn kind(&self) -> DetectorKind {
        DetectorKind::MacVision
    }

    fn ensure_available(&self, _config: &DetectorConfig) -> Result<(), DetectionError> {
        Ok(())
    }

    fn build(&self, _config: &DetectorConfig) -> Result<Box<dyn RegionDetector>, DetectionError> {
        Ok(Box::new(VisionTextDetector::new()))
    }
}

#[cfg(all(feature = "detector-vision", target_os = "macos"))]
static VISION_BACKEND: VisionBackend = VisionBackend;

struct ReplayBackend;

impl DetectorBackend for ReplayBackend {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Replay
    }

    fn ensure_available(&self, config: &DetectorConfig) -> Result<(), DetectionError> {
        let path = config
            .replay_path
            .as_ref()
            .ok_or(DetectionError::MissingReplaySource)?;
        if !path.exists() {
            return Err(DetectionError::Io {
                path: path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            });
        }
        Ok(())
    }

    fn build(&self, config: &DetectorConfig) -> Result<Box<dyn RegionDetector>, DetectionError> {
        let path = config
            .replay_path
            .as_ref()
            .ok_or(DetectionError::MissingReplaySource)?;
        Ok(Box::new(ReplayDetector::from_path(path)?))
    }
}

static REPLAY_BACKEND: ReplayBackend = ReplayBackend;

fn backend_for_kind(kind: DetectorKind) -> Option<&'static dyn DetectorBackend> {
    match kind {
        DetectorKind::Auto => None,
        DetectorKind::MacVision => {
            #[cfg(all(feature = "detector-vision", target_os = "macos"))]
            {
                return Some(&VISION_BACKEND);
            }
            #[cfg(not(all(feature = "detector-vision", target_os = "macos")))]
            {
                return None;
            }
        }
        DetectorKind::Replay => Some(&REPLAY_BACKEND),
    }
}

pub fn build_detector(
    kind: DetectorKind,
    config: &DetectorConfig,
) -> Result<Box<dyn RegionDetector>, DetectionError> {
    match kind {
        DetectorKind::Auto => build_auto(config),
        _ => {
            let backend = backend_for_kind(kind).ok_or(DetectionError::Unsupported {
                backend: kind.as_str(),
            })?;
            backend.ensure_available(config)?;
            backend.build(config)
        }
    }
}

fn build_auto(config: &DetectorConfig) -> Result<Box<dyn RegionDetector>, DetectionError> {
    let mut last_err: Option<DetectionError> = None;
    for &candidate in AUTO_DETECTOR_PRIORITY {
        let Some(backend) = backend_for_kind(candidate) else {
            let err = DetectionError::Unsupported {
                backend: candidate.as_str(),
            };
            log::warn!(
                "auto detector candidate '{}' unavailable: {err}",
                candidate.as_str()
            );
            last_err = Some(err);
            continue;
        };
        match backend
            .ensure_available(config)
            .and_then(|()| backend.build(config))
        {
            Ok(detector) => {
                log::debug!("auto detector selected '{}'", backend.kind().as_str());
                return Ok(detector);
            }
            Err(err) => {
                log::warn!(
                    "auto detector candidate '{}' unavailable: {err}",
                    candidate.as_str()
                );
                last_err = Some(err);
            }
        }
    }
    Err(last_err.unwrap_or(DetectionError::Unsupported {
        backend: DetectorKind::Auto.as_str(),
    }))
}

/// Rejects detector output that cannot be mapped onto the image.
pub(crate) fn validate_regions(regions: &[TextRegion]) -> Result<(), DetectionError> {
    for (region_index, region) in regions.iter().enumerate() {
        for (box_index, quad) in region.characters.iter().enumerate() {
            if !quad.is_finite() {
                return Err(DetectionError::MalformedResult(format!(
                    "region {region_index} box {box_index} has non-finite corners"
                )));
            }
        }
    }
    Ok(())
}
