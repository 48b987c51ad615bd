//! Reads per-character text off an image.
//!
//! [`SymbolReader`] asks a [`RegionDetector`] for text regions and their
//! character boxes, rectifies every box that lies inside the image, and
//! concatenates the [`CharacterClassifier`]'s best label per box into one word
//! per region.

pub mod cli;
pub mod reader;
pub mod rectify;
pub mod settings;

pub use reader::{EmptyRegionPolicy, ReadError, ReaderOptions, SymbolReader};
pub use rectify::{RectifyError, rectify};
pub use symbol_scan_classifier::{CharacterClassifier, Classification, ClassificationError};
pub use symbol_scan_detector::{DetectionError, RegionDetector};
pub use symbol_scan_types::{
    NormalizedQuad, Point, Prediction, RecognizedCharacter, RecognizedWord, SkipReason,
    SkippedCharacter, TextRegion,
};
