use std::ffi::OsString;
use std::path::PathBuf;

use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};
use symbol_scan_detector::DetectorKind;

use crate::reader::EmptyRegionPolicy;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum DetectorChoice {
    Auto,
    Vision,
    Replay,
}

impl From<DetectorChoice> for DetectorKind {
    fn from(choice: DetectorChoice) -> Self {
        match choice {
            DetectorChoice::Auto => DetectorKind::Auto,
            DetectorChoice::Vision => DetectorKind::MacVision,
            DetectorChoice::Replay => DetectorKind::Replay,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum EmptyRegions {
    Keep,
    Omit,
}

impl From<EmptyRegions> for EmptyRegionPolicy {
    fn from(value: EmptyRegions) -> Self {
        match value {
            EmptyRegions::Keep => EmptyRegionPolicy::Keep,
            EmptyRegions::Omit => EmptyRegionPolicy::Omit,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Default)]
pub struct CliSources {
    pub detector_from_cli: bool,
    pub input_width_from_cli: bool,
    pub input_height_from_cli: bool,
    pub empty_regions_from_cli: bool,
    pub format_from_cli: bool,
}

impl CliSources {
    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            detector_from_cli: value_from_cli(matches, "detector"),
            input_width_from_cli: value_from_cli(matches, "input_width"),
            input_height_from_cli: value_from_cli(matches, "input_height"),
            empty_regions_from_cli: value_from_cli(matches, "empty_regions"),
            format_from_cli: value_from_cli(matches, "format"),
        }
    }
}

fn value_from_cli(matches: &ArgMatches, id: &str) -> bool {
    matches
        .value_source(id)
        .is_some_and(|source| matches!(source, ValueSource::CommandLine))
}

pub fn parse_cli() -> (CliArgs, CliSources) {
    match parse_cli_from(std::env::args_os()) {
        Ok(parsed) => parsed,
        Err(err) => err.exit(),
    }
}

pub fn parse_cli_from<I, T>(args: I) -> Result<(CliArgs, CliSources), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = CliArgs::command().try_get_matches_from(args)?;
    let args = CliArgs::from_arg_matches(&matches)?;
    let sources = CliSources::from_matches(&matches);
    Ok((args, sources))
}

#[derive(Debug, Parser)]
#[command(
    name = "symbol-scan",
    about = "Detect text regions in an image and read them character by character",
    disable_help_subcommand = true
)]
pub struct CliArgs {
    /// Override the configuration file path
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Text region detector backend
    #[arg(long = "detector", id = "detector", value_enum, default_value_t = DetectorChoice::Auto)]
    pub detector: DetectorChoice,

    /// Recorded detections (JSON) served by the replay detector
    #[arg(long = "regions", value_name = "FILE")]
    pub regions: Option<PathBuf>,

    /// ONNX model classifying single rectified characters
    #[arg(long = "classifier-model", value_name = "FILE")]
    pub classifier_model: Option<PathBuf>,

    /// Class labels in model output order, one character per label
    #[arg(long = "alphabet", value_name = "CHARS")]
    pub alphabet: Option<String>,

    /// Classifier input width in pixels
    #[arg(
        long = "input-width",
        id = "input_width",
        default_value_t = 28,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub input_width: u32,

    /// Classifier input height in pixels
    #[arg(
        long = "input-height",
        id = "input_height",
        default_value_t = 28,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub input_height: u32,

    /// Keep or drop regions in which no character was recognized
    #[arg(
        long = "empty-regions",
        id = "empty_regions",
        value_enum,
        default_value_t = EmptyRegions::Keep
    )]
    pub empty_regions: EmptyRegions,

    /// Output format for recognized words
    #[arg(long = "format", id = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Print the list of detector backends compiled into this binary
    #[arg(long = "list-detectors")]
    pub list_detectors: bool,

    /// Input image path
    pub input: Option<PathBuf>,
}
