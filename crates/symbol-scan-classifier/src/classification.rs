use crate::alphabet::Alphabet;
use crate::error::ClassificationError;

/// One candidate label for a character crop.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    pub confidence: f32,
}

impl Classification {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// Softmax over raw class scores, ranked best-first.
///
/// `logits` must hold exactly one score per alphabet label.
pub fn rank_logits(
    logits: &[f32],
    alphabet: &Alphabet,
) -> Result<Vec<Classification>, ClassificationError> {
    if logits.len() != alphabet.len() {
        return Err(ClassificationError::UnexpectedOutput(format!(
            "expected {} class scores, got {}",
            alphabet.len(),
            logits.len()
        )));
    }
    if logits.iter().any(|value| !value.is_finite()) {
        return Err(ClassificationError::UnexpectedOutput(
            "class scores contain non-finite values".into(),
        ));
    }

    let max_logit = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|v| (v - max_logit).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum <= 0.0 {
        return Ok(Vec::new());
    }

    let mut ranked: Vec<Classification> = exps
        .iter()
        .enumerate()
        .filter_map(|(index, exp)| {
            alphabet
                .get(index)
                .map(|label| Classification::new(label, exp / sum))
        })
        .collect();
    ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    Ok(ranked)
}
