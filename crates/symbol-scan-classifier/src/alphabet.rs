use std::collections::HashSet;
use std::sync::Arc;

use crate::error::ClassificationError;

/// Digits followed by uppercase Latin letters, the label set of the bundled
/// single-font character model.
const DEFAULT_ALPHABET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Ordered labels matching the classifier's output classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    labels: Arc<[String]>,
}

impl Default for Alphabet {
    fn default() -> Self {
        Self {
            labels: DEFAULT_ALPHABET.chars().map(String::from).collect(),
        }
    }
}

impl Alphabet {
    /// One label per character of `value`, in order.
    pub fn parse(value: &str) -> Result<Self, ClassificationError> {
        let labels: Vec<String> = value
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(String::from)
            .collect();
        Self::from_labels(labels)
    }

    pub fn from_labels(labels: Vec<String>) -> Result<Self, ClassificationError> {
        if labels.is_empty() {
            return Err(ClassificationError::InvalidAlphabet(
                "alphabet must contain at least one label".into(),
            ));
        }
        let mut seen = HashSet::with_capacity(labels.len());
        for label in &labels {
            if label.is_empty() {
                return Err(ClassificationError::InvalidAlphabet(
                    "labels must not be empty".into(),
                ));
            }
            if !seen.insert(label.as_str()) {
                return Err(ClassificationError::InvalidAlphabet(format!(
                    "duplicate label '{label}'"
                )));
            }
        }
        Ok(Self {
            labels: labels.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}
