use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use directories::{BaseDirs, ProjectDirs};
use serde::Deserialize;

use crate::cli::{CliArgs, CliSources, DetectorChoice, EmptyRegions, OutputFormat};

const PROJECT_CONFIG_FILE: &str = "symbol-scan.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    detector: Option<String>,
    regions: Option<String>,
    classifier_model: Option<String>,
    alphabet: Option<String>,
    input_width: Option<u32>,
    input_height: Option<u32>,
    empty_regions: Option<String>,
    format: Option<String>,
}

#[derive(Debug)]
pub struct EffectiveSettings {
    pub detector: DetectorChoice,
    pub regions: Option<PathBuf>,
    pub classifier_model: Option<PathBuf>,
    pub alphabet: Option<String>,
    pub input_width: u32,
    pub input_height: u32,
    pub empty_regions: EmptyRegions,
    pub format: OutputFormat,
    pub config_path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    InvalidValue {
        path: Option<PathBuf>,
        field: &'static str,
        value: String,
    },
    NotFound {
        path: PathBuf,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(
                    f,
                    "failed to read config file {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Parse { path, source } => {
                write!(
                    f,
                    "failed to parse config file {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::InvalidValue { path, field, value } => {
                if let Some(path) = path {
                    write!(
                        f,
                        "invalid value '{}' for '{}' in {}",
                        value,
                        field,
                        path.display()
                    )
                } else {
                    write!(f, "invalid value '{}' for '{}'", value, field)
                }
            }
            ConfigError::NotFound { path } => {
                write!(f, "config file {} does not exist", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::InvalidValue { .. } => None,
            ConfigError::NotFound { .. } => None,
        }
    }
}

pub fn resolve_settings(
    cli: &CliArgs,
    sources: &CliSources,
) -> Result<EffectiveSettings, ConfigError> {
    let (file, config_path) = load_config(cli.config.as_deref())?;
    merge(cli, sources, file, config_path)
}

fn load_config(path_override: Option<&Path>) -> Result<(FileConfig, Option<PathBuf>), ConfigError> {
    if let Some(path) = path_override {
        let path = path.to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound { path });
        }
        let config = read_config(&path)?;
        return Ok((config, Some(path)));
    }

    for candidate in [project_config_path(), default_config_path()]
        .into_iter()
        .flatten()
    {
        if candidate.exists() {
            let config = read_config(&candidate)?;
            log::debug!("loaded configuration from {}", candidate.display());
            return Ok((config, Some(candidate)));
        }
    }
    Ok((FileConfig::default(), None))
}

fn read_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn merge(
    cli: &CliArgs,
    sources: &CliSources,
    file: FileConfig,
    config_path: Option<PathBuf>,
) -> Result<EffectiveSettings, ConfigError> {
    let config_dir = config_path
        .as_ref()
        .and_then(|path| path.parent().map(|dir| dir.to_path_buf()));

    let FileConfig {
        detector: file_detector,
        regions: file_regions,
        classifier_model: file_classifier_model,
        alphabet: file_alphabet,
        input_width: file_input_width,
        input_height: file_input_height,
        empty_regions: file_empty_regions,
        format: file_format,
    } = file;

    let mut detector = cli.detector;
    if !sources.detector_from_cli {
        if let Some(value) = normalize_string(file_detector) {
            detector = parse_value(&value, "detector", config_path.as_ref())?;
        }
    }

    let regions = match cli.regions.clone() {
        Some(path) => Some(expand_pathbuf(path)),
        None => normalize_string(file_regions)
            .and_then(|value| resolve_path_from_config(value, config_dir.as_deref())),
    };

    let classifier_model = match cli.classifier_model.clone() {
        Some(path) => Some(expand_pathbuf(path)),
        None => normalize_string(file_classifier_model)
            .and_then(|value| resolve_path_from_config(value, config_dir.as_deref())),
    };

    let alphabet = normalize_string(cli.alphabet.clone()).or_else(|| normalize_string(file_alphabet));

    let mut input_width = cli.input_width;
    if !sources.input_width_from_cli {
        if let Some(value) = file_input_width {
            input_width = positive(value, "input_width", config_path.as_ref())?;
        }
    }

    let mut input_height = cli.input_height;
    if !sources.input_height_from_cli {
        if let Some(value) = file_input_height {
            input_height = positive(value, "input_height", config_path.as_ref())?;
        }
    }

    let mut empty_regions = cli.empty_regions;
    if !sources.empty_regions_from_cli {
        if let Some(value) = normalize_string(file_empty_regions) {
            empty_regions = parse_value(&value, "empty_regions", config_path.as_ref())?;
        }
    }

    let mut format = cli.format;
    if !sources.format_from_cli {
        if let Some(value) = normalize_string(file_format) {
            format = parse_value(&value, "format", config_path.as_ref())?;
        }
    }

    Ok(EffectiveSettings {
        detector,
        regions,
        classifier_model,
        alphabet,
        input_width,
        input_height,
        empty_regions,
        format,
        config_path,
    })
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("rs", "symbol-scan", "symbol-scan")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    env::current_dir()
        .ok()
        .map(|dir| dir.join(PROJECT_CONFIG_FILE))
}

fn normalize_string(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn expand_pathbuf(path: PathBuf) -> PathBuf {
    match path.to_str() {
        Some(s) => expand_home_path(s),
        None => path,
    }
}

fn resolve_path_from_config(value: String, base: Option<&Path>) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let expanded = expand_home_path(trimmed);
    match base {
        Some(base) if !expanded.is_absolute() => Some(base.join(expanded)),
        _ => Some(expanded),
    }
}

fn expand_home_path(value: &str) -> PathBuf {
    if value == "~" {
        if let Some(base) = BaseDirs::new() {
            return base.home_dir().to_path_buf();
        }
    } else if let Some(stripped) = value.strip_prefix("~/") {
        if let Some(base) = BaseDirs::new() {
            return base.home_dir().join(stripped);
        }
    }
    PathBuf::from(value)
}

fn positive(value: u32, field: &'static str, path: Option<&PathBuf>) -> Result<u32, ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            path: path.cloned(),
            field,
            value: value.to_string(),
        });
    }
    Ok(value)
}

fn parse_value<T: ValueEnum>(
    value: &str,
    field: &'static str,
    path: Option<&PathBuf>,
) -> Result<T, ConfigError> {
    T::from_str(value, true).map_err(|_| ConfigError::InvalidValue {
        path: path.cloned(),
        field,
        value: value.to_string(),
    })
}
