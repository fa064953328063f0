#![cfg(feature = "backend-tract")]

use std::path::Path;

use tract_onnx::prelude::*;

use crate::classify::backend::ClassifierBackend;
use crate::error::{InferenceError, LoadError};
use crate::tile::{Tile, TILE_SIDE};

/// Tract-based classifier for ONNX letter models.
///
/// Loads a local model file once and performs inference on 28x28 tiles.
/// The model is expected to take a `[1, 1, 28, 28]` f32 input (batch of
/// one) and produce one probability per letter class.
pub struct TractClassifier {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    class_count: usize,
}

impl TractClassifier {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn load<P: AsRef<Path>>(model_path: P, class_count: usize) -> Result<Self, LoadError> {
        let model_path = model_path.as_ref();
        if !model_path.exists() {
            return Err(LoadError::Missing {
                path: model_path.display().to_string(),
            });
        }

        let side = TILE_SIDE as usize;
        let model = (|| -> TractResult<SimplePlan<TypedFact, Box<dyn TypedOp>>> {
            tract_onnx::onnx()
                .model_for_path(model_path)?
                .with_input_fact(
                    0,
                    InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 1, side, side)),
                )?
                .into_optimized()?
                .into_runnable()
        })()
        .map_err(|e| LoadError::Artifact {
            path: model_path.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { model, class_count })
    }
}

impl ClassifierBackend for TractClassifier {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn class_count(&self) -> usize {
        self.class_count
    }

    fn infer(&mut self, tile: &Tile) -> Result<Vec<f32>, InferenceError> {
        let side = TILE_SIDE as usize;
        let input = tract_ndarray::Array4::from_shape_fn((1, 1, side, side), |(_, _, y, x)| {
            tile.get(x as u32, y as u32)
        });

        let outputs = self
            .model
            .run(tvec!(input.into_tensor().into_tvalue()))
            .map_err(|e| InferenceError::Backend(format!("onnx inference failed: {}", e)))?;

        let output = outputs
            .get(0)
            .ok_or_else(|| InferenceError::Backend("model produced no outputs".to_string()))?;
        let scores = output
            .to_array_view::<f32>()
            .map_err(|e| InferenceError::Backend(format!("model output was not f32: {}", e)))?;

        let probabilities: Vec<f32> = scores.iter().copied().collect();
        if probabilities.len() != self.class_count {
            return Err(InferenceError::OutputShape {
                expected: self.class_count,
                actual: probabilities.len(),
            });
        }

        Ok(probabilities)
    }
}
