use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::{Rgba, RgbaImage};
use image::imageops::{self, FilterType};
use ndarray::{Array4, CowArray, IxDyn};
use once_cell::sync::OnceCell;
use ort::environment::Environment;
use ort::error::OrtError;
use ort::session::{Session, SessionBuilder};
use ort::value::Value;

use crate::{Alphabet, CharacterClassifier, Classification, ClassificationError, rank_logits};

const DEFAULT_INPUT_WIDTH: u32 = 28;
const DEFAULT_INPUT_HEIGHT: u32 = 28;

#[derive(Debug)]
struct ModelHandle {
    _environment: Arc<Environment>,
    session: Session,
}

struct ModelRegistry {
    environment: Arc<Environment>,
    handles: Mutex<HashMap<PathBuf, Arc<ModelHandle>>>,
}

impl ModelRegistry {
    fn new() -> Result<Self, ClassificationError> {
        let environment = Environment::builder()
            .with_name("symbol-scan-classifier")
            .build()
            .map_err(map_environment_error)?;
        Ok(Self {
            environment: Arc::new(environment),
            handles: Mutex::new(HashMap::new()),
        })
    }

    fn get(&self, path: &Path) -> Result<Arc<ModelHandle>, ClassificationError> {
        let mut guard = self
            .handles
            .lock()
            .map_err(|_| ClassificationError::backend("onnx model registry poisoned"))?;
        if let Some(handle) = guard.get(path) {
            return Ok(Arc::clone(handle));
        }

        log::debug!("loading character model {}", path.display());
        let session = SessionBuilder::new(&self.environment)
            .map_err(map_session_error)?
            .with_model_from_file(path)
            .map_err(map_session_error)?;

        let handle = Arc::new(ModelHandle {
            _environment: Arc::clone(&self.environment),
            session,
        });
        guard.insert(path.to_path_buf(), Arc::clone(&handle));
        Ok(handle)
    }
}

static MODEL_REGISTRY: OnceCell<ModelRegistry> = OnceCell::new();

fn registry() -> Result<&'static ModelRegistry, ClassificationError> {
    MODEL_REGISTRY.get_or_try_init(ModelRegistry::new)
}

#[derive(Debug, Clone)]
pub struct OnnxClassifierConfig {
    pub model_path: PathBuf,
    pub alphabet: Alphabet,
    pub input_width: u32,
    pub input_height: u32,
}

impl OnnxClassifierConfig {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            alphabet: Alphabet::default(),
            input_width: DEFAULT_INPUT_WIDTH,
            input_height: DEFAULT_INPUT_HEIGHT,
        }
    }
}

/// Single-character classifier backed by an ONNX model.
///
/// The model takes a `1x1xHxW` grayscale tensor in `[0,1]` and emits one score
/// per alphabet label.
#[derive(Debug)]
pub struct OnnxCharacterClassifier {
    model: Arc<ModelHandle>,
    alphabet: Alphabet,
    input_width: u32,
    input_height: u32,
}

impl OnnxCharacterClassifier {
    pub fn new(config: OnnxClassifierConfig) -> Result<Self, ClassificationError> {
        if config.input_width == 0 || config.input_height == 0 {
            return Err(ClassificationError::backend(format!(
                "invalid model input size {}x{}",
                config.input_width, config.input_height
            )));
        }
        if !config.model_path.exists() {
            return Err(ClassificationError::ModelNotFound {
                path: config.model_path,
            });
        }
        let model = registry()?.get(&config.model_path)?;
        Ok(Self {
            model,
            alphabet: config.alphabet,
            input_width: config.input_width,
            input_height: config.input_height,
        })
    }

    fn run_model(&self, input: &Array4<f32>) -> Result<Vec<f32>, ClassificationError> {
        let session = &self.model.session;
        let allocator = session.allocator();
        let input_dyn: CowArray<'_, f32, IxDyn> = CowArray::from(input.view().into_dyn());
        let tensor = Value::from_array(allocator, &input_dyn).map_err(map_input_error)?;
        let outputs = session.run(vec![tensor]).map_err(map_inference_error)?;
        let tensor = outputs
            .into_iter()
            .next()
            .ok_or_else(|| ClassificationError::UnexpectedOutput("model produced no output".into()))?
            .try_extract::<f32>()
            .map_err(map_inference_error)?;
        let view = tensor.view();
        let significant: Vec<usize> = view.shape().iter().copied().filter(|d| *d != 1).collect();
        if significant.len() > 1 {
            return Err(ClassificationError::UnexpectedOutput(format!(
                "expected a single score vector, got shape {:?}",
                view.shape()
            )));
        }
        Ok(view.iter().copied().collect())
    }
}

impl CharacterClassifier for OnnxCharacterClassifier {
    fn name(&self) -> &'static str {
        "onnx_character"
    }

    fn warm_up(&self) -> Result<(), ClassificationError> {
        let blank = RgbaImage::from_pixel(
            self.input_width,
            self.input_height,
            Rgba([255, 255, 255, 255]),
        );
        self.classify(&blank).map(|_| ())
    }

    fn classify(&self, image: &RgbaImage) -> Result<Vec<Classification>, ClassificationError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ClassificationError::EmptyImage);
        }
        let input = prepare_input_tensor(image, self.input_width, self.input_height)?;
        let logits = self.run_model(&input)?;
        rank_logits(&logits, &self.alphabet)
    }
}

/// Scale-fill resize to the model input, then grayscale in `[0,1]`.
///
/// Transparent pixels left by rectification are composited onto white.
fn prepare_input_tensor(
    image: &RgbaImage,
    width: u32,
    height: u32,
) -> Result<Array4<f32>, ClassificationError> {
    let resized = if image.width() == width && image.height() == height {
        image.clone()
    } else {
        imageops::resize(image, width, height, FilterType::Triangle)
    };

    let mut data = Vec::with_capacity((width * height) as usize);
    for pixel in resized.pixels() {
        let [r, g, b, a] = pixel.0;
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        let alpha = a as f32 / 255.0;
        let value = luma * alpha + 255.0 * (1.0 - alpha);
        data.push((value / 255.0).clamp(0.0, 1.0));
    }

    Array4::from_shape_vec((1, 1, height as usize, width as usize), data).map_err(|err| {
        ClassificationError::backend(format!("failed to build ONNX input tensor: {err}"))
    })
}

fn map_environment_error(err: OrtError) -> ClassificationError {
    map_schema_conflict(err, "failed to initialise ONNX runtime environment")
}

fn map_session_error(err: OrtError) -> ClassificationError {
    map_schema_conflict(err, "failed to load ONNX model")
}

fn map_input_error(err: OrtError) -> ClassificationError {
    ClassificationError::backend(format!("failed to prepare ONNX input: {err}"))
}

fn map_inference_error(err: OrtError) -> ClassificationError {
    ClassificationError::backend(format!("ONNX inference failed: {err}"))
}

fn map_schema_conflict(err: OrtError, context: &str) -> ClassificationError {
    let message = err.to_string();
    if message.contains("Trying to register schema with name") {
        ClassificationError::backend(format!(
            "{context}: detected ONNX Runtime schema registration conflict ({message})"
        ))
    } else {
        ClassificationError::backend(format!("{context}: {message}"))
    }
}
