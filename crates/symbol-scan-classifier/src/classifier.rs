use image::RgbaImage;

use crate::classification::Classification;
use crate::error::ClassificationError;

/// Common interface for character classifiers.
///
/// `classify` receives one rectified character crop and returns labels ranked
/// best-first. An empty list means the model had no opinion.
pub trait CharacterClassifier: Send + Sync {
    fn name(&self) -> &'static str;

    fn warm_up(&self) -> Result<(), ClassificationError> {
        Ok(())
    }

    fn classify(&self, image: &RgbaImage) -> Result<Vec<Classification>, ClassificationError>;
}
