use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("classifier model file not found: {path}")]
    ModelNotFound { path: PathBuf },
    #[error("invalid alphabet: {0}")]
    InvalidAlphabet(String),
    #[error("character image has zero width or height")]
    EmptyImage,
    #[error("unexpected classifier output: {0}")]
    UnexpectedOutput(String),
    #[error("backend error: {message}")]
    Backend { message: String },
}

impl ClassificationError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}
