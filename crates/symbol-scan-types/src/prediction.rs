use serde::Serialize;

/// Why a character box did not contribute to its word.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum SkipReason {
    /// The box's pixel bounding rectangle leaves the image extent.
    OutOfBounds,
    /// The quad could not be cropped or perspective-corrected.
    Rectification(String),
    /// The classifier returned an error.
    Classification(String),
    /// The classifier succeeded but reported no usable label.
    NoResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedCharacter {
    pub box_index: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognizedCharacter {
    pub box_index: usize,
    pub label: String,
    pub confidence: f32,
}

/// Characters recognized inside one detected region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognizedWord {
    pub region_index: usize,
    pub text: String,
    pub characters: Vec<RecognizedCharacter>,
    pub skipped: Vec<SkippedCharacter>,
}

impl RecognizedWord {
    pub fn new(region_index: usize) -> Self {
        Self {
            region_index,
            text: String::new(),
            characters: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn push_character(&mut self, box_index: usize, label: String, confidence: f32) {
        self.text.push_str(&label);
        self.characters.push(RecognizedCharacter {
            box_index,
            label,
            confidence,
        });
    }

    pub fn skip(&mut self, box_index: usize, reason: SkipReason) {
        self.skipped.push(SkippedCharacter { box_index, reason });
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Words recognized in one image, in detection order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Prediction {
    words: Vec<RecognizedWord>,
}

impl Prediction {
    pub fn new(words: Vec<RecognizedWord>) -> Self {
        Self { words }
    }

    pub fn words(&self) -> &[RecognizedWord] {
        &self.words
    }

    pub fn into_words(self) -> Vec<RecognizedWord> {
        self.words
    }

    /// Plain word strings, one per emitted region.
    pub fn names(&self) -> Vec<&str> {
        self.words.iter().map(|word| word.text.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// False when any character box was skipped.
    pub fn is_complete(&self) -> bool {
        self.words.iter().all(|word| word.skipped.is_empty())
    }

    pub fn skipped_count(&self) -> usize {
        self.words.iter().map(|word| word.skipped.len()).sum()
    }
}
