use std::sync::Arc;

use image::RgbaImage;
use log::{debug, warn};
use symbol_scan_classifier::CharacterClassifier;
use symbol_scan_detector::{DetectionError, RegionDetector};
use symbol_scan_types::{
    NormalizedQuad, Prediction, RecognizedWord, ScaleTransform, SkipReason, TextRegion,
};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinHandle};

use crate::rectify::rectify;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("text region detection failed: {0}")]
    Detection(#[from] DetectionError),
    #[error("recognition worker failed: {0}")]
    Worker(String),
}

impl From<JoinError> for ReadError {
    fn from(err: JoinError) -> Self {
        if err.is_cancelled() {
            ReadError::Worker("recognition task was cancelled".into())
        } else {
            ReadError::Worker(format!("recognition task panicked: {err}"))
        }
    }
}

/// What to do with a region that ends up without any recognized character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyRegionPolicy {
    /// Emit an empty word so word indices line up with detected regions.
    #[default]
    Keep,
    Omit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderOptions {
    pub empty_regions: EmptyRegionPolicy,
}

/// Runs detection, rectification and classification for one image at a time.
///
/// The reader keeps no per-call state, so clones share the same backends and
/// any number of calls may run at once.
#[derive(Clone)]
pub struct SymbolReader {
    detector: Arc<dyn RegionDetector>,
    classifier: Arc<dyn CharacterClassifier>,
    options: ReaderOptions,
}

impl SymbolReader {
    pub fn new(
        detector: Arc<dyn RegionDetector>,
        classifier: Arc<dyn CharacterClassifier>,
    ) -> Self {
        Self::with_options(detector, classifier, ReaderOptions::default())
    }

    pub fn with_options(
        detector: Arc<dyn RegionDetector>,
        classifier: Arc<dyn CharacterClassifier>,
        options: ReaderOptions,
    ) -> Self {
        Self {
            detector,
            classifier,
            options,
        }
    }

    pub fn options(&self) -> ReaderOptions {
        self.options
    }

    /// Reads every detected region of `image` on the calling thread.
    pub fn read_blocking(&self, image: &RgbaImage) -> Result<Prediction, ReadError> {
        let regions = self.detector.detect(image)?;
        let transform = ScaleTransform::for_image(image.width(), image.height());

        let mut words = Vec::with_capacity(regions.len());
        for (region_index, region) in regions.iter().enumerate() {
            if region.characters.is_empty() {
                debug!("region {region_index} has no character boxes");
                continue;
            }
            let word = self.read_region(image, &transform, region_index, region);
            if word.is_empty() && self.options.empty_regions == EmptyRegionPolicy::Omit {
                debug!("omitting empty region {region_index}");
                continue;
            }
            words.push(word);
        }

        let prediction = Prediction::new(words);
        debug!(
            "{} read {} regions into {} words ({} characters skipped)",
            self.detector.name(),
            regions.len(),
            prediction.len(),
            prediction.skipped_count()
        );
        Ok(prediction)
    }

    /// Reads `image` on the blocking worker pool.
    pub async fn read(&self, image: Arc<RgbaImage>) -> Result<Prediction, ReadError> {
        let reader = self.clone();
        tokio::task::spawn_blocking(move || reader.read_blocking(&image)).await?
    }

    /// Reads `image` in the background and hands the outcome to `handler`,
    /// which runs exactly once as a task on `delivery`.
    pub fn submit<F>(&self, image: Arc<RgbaImage>, delivery: &Handle, handler: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<Prediction, ReadError>) + Send + 'static,
    {
        let reader = self.clone();
        delivery.spawn(async move {
            let result = reader.read(image).await;
            handler(result);
        })
    }

    fn read_region(
        &self,
        image: &RgbaImage,
        transform: &ScaleTransform,
        region_index: usize,
        region: &TextRegion,
    ) -> RecognizedWord {
        let mut word = RecognizedWord::new(region_index);
        for (box_index, quad) in region.characters.iter().enumerate() {
            match self.read_character(image, transform, quad) {
                Ok((label, confidence)) => word.push_character(box_index, label, confidence),
                Err(reason) => {
                    if reason != SkipReason::OutOfBounds {
                        warn!("region {region_index} box {box_index} skipped: {reason:?}");
                    }
                    word.skip(box_index, reason);
                }
            }
        }
        word
    }

    fn read_character(
        &self,
        image: &RgbaImage,
        transform: &ScaleTransform,
        quad: &NormalizedQuad,
    ) -> Result<(String, f32), SkipReason> {
        let pixel_quad = transform.quad(quad);
        let bounds = pixel_quad.bounding_rect();
        if !bounds.is_within(image.width(), image.height()) {
            warn!(
                "character box {:?} lies outside the {}x{} image",
                bounds,
                image.width(),
                image.height()
            );
            return Err(SkipReason::OutOfBounds);
        }

        let rectified = rectify(image, &pixel_quad)
            .map_err(|err| SkipReason::Rectification(err.to_string()))?;
        let ranked = self
            .classifier
            .classify(&rectified)
            .map_err(|err| SkipReason::Classification(err.to_string()))?;
        match ranked.into_iter().next() {
            Some(best) if !best.label.is_empty() => Ok((best.label, best.confidence)),
            _ => Err(SkipReason::NoResult),
        }
    }
}
