// ONNX classifier backed by tract
use std::path::Path;

use log::info;
use tract_onnx::prelude::*;
use tract_onnx::tract_hir::internal::DimLike;

use super::{InferenceEngine, ModelDescriptor};
use crate::error::{ClassifyError, StartupError};

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>;

pub struct OnnxClassifier {
    plan: Plan,
    descriptor: ModelDescriptor,
}

impl OnnxClassifier {
    pub fn load(model_path: &Path) -> Result<Self, StartupError> {
        let model_error = |e: TractError| StartupError::Model {
            path: model_path.to_path_buf(),
            reason: format!("{e:#}"),
        };

        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .map_err(model_error)?;

        // read the declared input shape before pinning the batch dimension
        let declared = model.clone().into_typed().map_err(model_error)?;
        let dims: Vec<Option<usize>> = declared
            .input_fact(0)
            .map_err(model_error)?
            .shape
            .iter()
            .map(|d| d.to_usize().ok())
            .collect();
        let input_shape = pin_input_shape(&dims)?;

        let optimized = model
            .with_input_fact(0, f32::fact(input_shape).into())
            .and_then(|m| m.into_optimized())
            .map_err(model_error)?;

        let output_shape = optimized
            .output_fact(0)
            .map_err(model_error)?
            .shape
            .as_concrete()
            .map(<[usize]>::to_vec)
            .ok_or_else(|| StartupError::Model {
                path: model_path.to_path_buf(),
                reason: "output shape is not fully known".into(),
            })?;

        let single_io = |outlets: &[OutletId]| match outlets {
            // prefer the tensor name from the model file over the optimized node name
            [outlet] => Ok(optimized
                .outlet_label(*outlet)
                .map(str::to_string)
                .unwrap_or_else(|| optimized.node(outlet.node).name.clone())),
            _ => Err(StartupError::Model {
                path: model_path.to_path_buf(),
                reason: format!("expected a single input and output, found {}", outlets.len()),
            }),
        };
        let input_name = single_io(optimized.input_outlets().map_err(model_error)?)?;
        let output_name = single_io(optimized.output_outlets().map_err(model_error)?)?;

        let plan = optimized.into_runnable().map_err(model_error)?;

        let descriptor = ModelDescriptor {
            input_shape,
            output_shape,
            input_name,
            output_name,
        };
        info!(
            "loaded model {}: input '{}' {:?}, output '{}' {:?}",
            model_path.display(),
            descriptor.input_name,
            descriptor.input_shape,
            descriptor.output_name,
            descriptor.output_shape
        );

        Ok(Self { plan, descriptor })
    }
}

/// Turns the declared input dims into a concrete NCHW shape.
///
/// An unknown batch dimension becomes 1. Channels must be 3 and the spatial
/// dimensions must be known.
pub fn pin_input_shape(dims: &[Option<usize>]) -> Result<[usize; 4], StartupError> {
    let shape_error = || {
        StartupError::InputShape(
            dims.iter()
                .map(|d| d.map_or_else(|| "?".to_string(), |d| d.to_string()))
                .collect(),
        )
    };
    match *dims {
        [batch, Some(3), Some(h), Some(w)] if h > 0 && w > 0 => {
            if batch.is_some_and(|b| b != 1) {
                return Err(shape_error());
            }
            Ok([1, 3, h, w])
        }
        _ => Err(shape_error()),
    }
}

impl InferenceEngine for OnnxClassifier {
    fn descriptor(&self) -> &ModelDescriptor {
        &self.descriptor
    }

    fn infer(&self, input: &candle::Tensor) -> Result<Vec<f32>, ClassifyError> {
        let engine_error = |e: TractError| ClassifyError::InferenceEngine(format!("{e:#}"));

        let values = input.flatten_all()?.to_vec1::<f32>()?;
        let tensor =
            Tensor::from_shape(&self.descriptor.input_shape, &values).map_err(engine_error)?;
        let outputs = self.plan.run(tvec!(tensor.into())).map_err(engine_error)?;
        let output = outputs
            .first()
            .ok_or_else(|| ClassifyError::InferenceEngine("model produced no output".into()))?;
        let activations = output.to_array_view::<f32>().map_err(engine_error)?;
        Ok(activations.iter().copied().collect())
    }
}
