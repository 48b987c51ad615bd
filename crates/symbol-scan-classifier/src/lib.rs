mod alphabet;
mod backends;
mod classification;
mod classifier;
mod error;

pub use alphabet::Alphabet;
#[cfg(feature = "classifier-onnx")]
pub use backends::onnx::{OnnxCharacterClassifier, OnnxClassifierConfig};
pub use classification::{Classification, rank_logits};
pub use classifier::CharacterClassifier;
pub use error::ClassificationError;
