// Shared, read-only state for every request
use std::sync::Arc;

use crate::labels::LabelList;
use crate::models::InferenceEngine;

#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn InferenceEngine>,
    pub labels: LabelList,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(model: Arc<dyn InferenceEngine>, labels: LabelList, max_upload_bytes: usize) -> Self {
        Self {
            model,
            labels,
            max_upload_bytes,
        }
    }
}
