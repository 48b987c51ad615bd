//! Shared domain models for the symbol-scan workspace.
//!
//! Detector, classifier and reader crates exchange these types. Keep the crate
//! backend-agnostic: no image buffers, no native SDKs, only geometry and the
//! recognition result.

mod geometry;
mod prediction;

pub use geometry::{NormalizedQuad, PixelQuad, PixelRect, Point, ScaleTransform, TextRegion};
pub use prediction::{
    Prediction, RecognizedCharacter, RecognizedWord, SkipReason, SkippedCharacter,
};
