// Top-1 reduction and the per-request classification pipeline
use serde::Serialize;

use crate::error::ClassifyError;
use crate::labels::LabelList;
use crate::models::InferenceEngine;
use crate::preprocess::preprocess;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictionResult {
    pub label_id: usize,
    pub label: String,
}

/// Index and value of the largest activation. The first maximum wins.
pub fn argmax(activations: &[f32]) -> Option<(usize, f32)> {
    let (&first, rest) = activations.split_first()?;
    let mut best = (0, first);
    for (i, &a) in rest.iter().enumerate() {
        if a > best.1 {
            best = (i + 1, a);
        }
    }
    Some(best)
}

pub fn top1(activations: &[f32], labels: &LabelList) -> Result<PredictionResult, ClassifyError> {
    let (index, _) = argmax(activations)
        .ok_or_else(|| ClassifyError::InferenceEngine("model produced no activations".into()))?;
    let label = labels
        .get(index)
        .ok_or(ClassifyError::LabelIndexOutOfRange {
            index,
            labels: labels.len(),
        })?;
    Ok(PredictionResult {
        label_id: index,
        label: label.to_string(),
    })
}

/// Runs one uploaded image through preprocessing, inference and top-1 lookup.
pub fn classify(
    engine: &dyn InferenceEngine,
    labels: &LabelList,
    image: &[u8],
) -> Result<PredictionResult, ClassifyError> {
    let descriptor = engine.descriptor();
    let input = preprocess(image, descriptor.height(), descriptor.width())?;

    let expected = descriptor.input_len();
    if input.elem_count() != expected {
        return Err(ClassifyError::ShapeMismatch {
            expected,
            actual: input.elem_count(),
        });
    }

    let activations = engine.infer(&input)?;
    top1(&activations, labels)
}
