use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("{backend} detector is not supported in this build")]
    Unsupported { backend: &'static str },
    #[error("unknown detector backend '{0}'")]
    UnknownBackend(String),
    #[error(
        "no replay source configured; provide --regions or set `regions` in the configuration file"
    )]
    MissingReplaySource,
    #[error("failed to read detections from {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse detections from {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("image has zero width or height")]
    EmptyImage,
    #[error("detector returned a malformed result: {0}")]
    MalformedResult(String),
    #[error("vision framework error: {0}")]
    Vision(String),
}
