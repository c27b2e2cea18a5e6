// Model handle abstraction shared by the request pipeline
pub mod onnx;

use candle::Tensor;

use crate::error::ClassifyError;

/// Shapes and tensor names of a loaded classifier. Fixed once loading is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    /// `[batch, channels, height, width]`, batch pinned to 1
    pub input_shape: [usize; 4],
    /// Last dimension is the number of classes
    pub output_shape: Vec<usize>,
    pub input_name: String,
    pub output_name: String,
}

impl ModelDescriptor {
    pub fn input_len(&self) -> usize {
        self.input_shape.iter().product()
    }

    pub fn height(&self) -> usize {
        self.input_shape[2]
    }

    pub fn width(&self) -> usize {
        self.input_shape[3]
    }

    pub fn num_classes(&self) -> usize {
        self.output_shape.last().copied().unwrap_or(0)
    }
}

/// A single-input, single-output image classifier.
///
/// Implementations are shared by every HTTP worker, so `infer` takes `&self`
/// and must be safe to call concurrently.
pub trait InferenceEngine: Send + Sync + 'static {
    fn descriptor(&self) -> &ModelDescriptor;

    /// Runs one forward pass and returns the flattened output activations.
    fn infer(&self, input: &Tensor) -> Result<Vec<f32>, ClassifyError>;
}
