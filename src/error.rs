// Error types for startup and per-request classification
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while classifying one uploaded image.
#[derive(Error, Debug)]
pub enum ClassifyError {
    /// The request body could not be read as a multipart upload
    #[error("invalid upload: {0}")]
    Upload(String),

    /// Uploaded bytes are not a decodable image
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("input tensor has {actual} elements, model expects {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// The inference engine rejected the run
    #[error("inference failed: {0}")]
    InferenceEngine(String),

    /// Argmax landed on a class the label file does not name
    #[error("predicted class {index} has no label ({labels} labels loaded)")]
    LabelIndexOutOfRange { index: usize, labels: usize },
}

impl From<candle::Error> for ClassifyError {
    fn from(e: candle::Error) -> Self {
        ClassifyError::InferenceEngine(e.to_string())
    }
}

/// Failures that keep the server from ever accepting connections.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("failed to load model '{path}': {reason}")]
    Model { path: PathBuf, reason: String },

    #[error("unsupported model input shape {0:?}: expected [batch, 3, height, width]")]
    InputShape(Vec<String>),

    #[error("failed to read labels '{path}': {source}")]
    Labels {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("label file '{0}' contains no labels")]
    EmptyLabels(PathBuf),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}
