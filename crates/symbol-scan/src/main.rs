use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[cfg(feature = "classifier-onnx")]
use symbol_scan::CharacterClassifier;
use symbol_scan::cli::{OutputFormat, parse_cli};
use symbol_scan::settings::{ConfigError, EffectiveSettings, resolve_settings};
use symbol_scan::{Prediction, ReadError, ReaderOptions, SymbolReader};
#[cfg(feature = "classifier-onnx")]
use symbol_scan_classifier::{Alphabet, OnnxCharacterClassifier, OnnxClassifierConfig};
use symbol_scan_classifier::ClassificationError;
use symbol_scan_detector::{DetectionError, DetectorConfig, DetectorKind, build_detector};
use thiserror::Error;

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Detection(#[from] DetectionError),
    #[error(transparent)]
    Classification(#[from] ClassificationError),
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error("failed to open image {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("no input image provided")]
    MissingInput,
    #[cfg(feature = "classifier-onnx")]
    #[error(
        "no classifier model configured; pass --classifier-model or set `classifier_model` in the configuration file"
    )]
    MissingModel,
    #[cfg(not(feature = "classifier-onnx"))]
    #[error("no character classifier compiled in; rebuild with the \"classifier-onnx\" feature")]
    NoClassifier,
    #[error("failed to encode prediction: {0}")]
    Output(#[from] serde_json::Error),
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("symbol-scan: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), AppError> {
    let (cli, sources) = parse_cli();
    if cli.list_detectors {
        print_available_detectors();
        return Ok(());
    }

    let settings = resolve_settings(&cli, &sources)?;
    let input = cli.input.clone().ok_or(AppError::MissingInput)?;

    let detector_config = DetectorConfig {
        replay_path: settings.regions.clone(),
    };
    let detector = build_detector(settings.detector.into(), &detector_config)?;
    log::debug!("using detector '{}'", detector.name());
    let classifier = build_classifier(&settings)?;
    let reader = SymbolReader::with_options(
        Arc::from(detector),
        classifier,
        ReaderOptions {
            empty_regions: settings.empty_regions.into(),
        },
    );

    let image = image::open(&input)
        .map_err(|source| AppError::Image {
            path: input.clone(),
            source,
        })?
        .to_rgba8();
    let prediction = reader.read(Arc::new(image)).await?;
    print_prediction(&prediction, settings.format)
}

#[cfg(feature = "classifier-onnx")]
fn build_classifier(
    settings: &EffectiveSettings,
) -> Result<Arc<dyn CharacterClassifier>, AppError> {
    let model_path = settings
        .classifier_model
        .clone()
        .ok_or(AppError::MissingModel)?;
    let mut config = OnnxClassifierConfig::new(model_path);
    if let Some(alphabet) = settings.alphabet.as_deref() {
        config.alphabet = Alphabet::parse(alphabet)?;
    }
    config.input_width = settings.input_width;
    config.input_height = settings.input_height;

    let classifier = OnnxCharacterClassifier::new(config)?;
    classifier.warm_up()?;
    Ok(Arc::new(classifier))
}

#[cfg(not(feature = "classifier-onnx"))]
fn build_classifier(
    _settings: &EffectiveSettings,
) -> Result<Arc<dyn symbol_scan::CharacterClassifier>, AppError> {
    Err(AppError::NoClassifier)
}

fn print_prediction(prediction: &Prediction, format: OutputFormat) -> Result<(), AppError> {
    match format {
        OutputFormat::Text => {
            for word in prediction.words() {
                println!("{}", word.text);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(prediction)?);
        }
    }
    if !prediction.is_complete() {
        log::warn!(
            "{} character boxes could not be read",
            prediction.skipped_count()
        );
    }
    Ok(())
}

fn print_available_detectors() {
    let names: Vec<&'static str> = DetectorKind::available()
        .into_iter()
        .map(DetectorKind::as_str)
        .collect();
    if names.is_empty() {
        println!("available detectors: (none compiled)");
    } else {
        println!("available detectors: {}", names.join(", "));
    }
}
