//! ONNX classifier artifact loading and inference.

use crate::error::{EngineError, EngineResult};
use crate::scoring::classifier::Classifier;
use crate::types::features::FEATURE_COUNT;
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType};
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, info, warn};

/// Classifier backed by an ONNX Runtime session.
///
/// The session is behind an `RwLock` because `ort` requires mutable access to
/// run inference.
#[derive(Debug)]
pub struct OnnxClassifier {
    session: RwLock<Session>,
    input_name: String,
    label_output: String,
    prob_output: String,
}

impl OnnxClassifier {
    /// Load the classifier artifact.
    ///
    /// Fails with [`EngineError::ModelUnavailable`] when the artifact cannot
    /// be loaded; callers treat that as fatal at startup.
    pub fn load<P: AsRef<Path>>(path: P, onnx_threads: usize) -> EngineResult<Self> {
        let path = path.as_ref();

        ort::init()
            .commit()
            .map_err(|e| EngineError::ModelUnavailable(format!("ONNX Runtime init failed: {}", e)))?;

        info!(path = %path.display(), threads = onnx_threads, "Loading classifier artifact");

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(onnx_threads))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| {
                EngineError::ModelUnavailable(format!(
                    "failed to load model from {}: {}",
                    path.display(),
                    e
                ))
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let label_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "output_label".to_string());

        let prob_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| {
                session
                    .outputs
                    .iter()
                    .find(|o| o.name.contains("output") && !o.name.contains("label"))
            })
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "probabilities".to_string());

        info!(
            input = %input_name,
            label_output = %label_output,
            prob_output = %prob_output,
            "Classifier artifact loaded"
        );

        Ok(Self {
            session: RwLock::new(session),
            input_name,
            label_output,
            prob_output,
        })
    }

    fn input_tensor(features: &[f32; FEATURE_COUNT]) -> EngineResult<ort::value::Tensor<f32>> {
        use ort::value::Tensor;

        let shape = vec![1_i64, FEATURE_COUNT as i64];
        Tensor::from_array((shape, features.to_vec()))
            .map_err(|e| EngineError::Inference(format!("failed to create input tensor: {}", e)))
    }

    /// Extract the probability triple from either a `[1, 3]` f32 tensor or
    /// the `seq(map(int64, float))` shape emitted by sklearn exports.
    fn extract_probabilities(
        &self,
        outputs: &ort::session::SessionOutputs,
    ) -> EngineResult<[f64; 3]> {
        if let Some(output) = outputs.get(&self.prob_output) {
            if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
                if data.len() >= 3 {
                    debug!(probs = ?&data[..3], "Extracted probabilities from tensor");
                    return Ok([data[0] as f64, data[1] as f64, data[2] as f64]);
                }
            }

            if DynSequenceValueType::can_downcast(&output.dtype()) {
                return self.extract_from_sequence_map(output);
            }
        }

        Err(EngineError::Inference(format!(
            "no probability output named {}",
            self.prob_output
        )))
    }

    fn extract_from_sequence_map(&self, output: &ort::value::DynValue) -> EngineResult<[f64; 3]> {
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(|e| EngineError::Inference(format!("failed to downcast to sequence: {}", e)))?;

        let maps = sequence
            .try_extract_sequence::<DynMapValueType>(&allocator)
            .map_err(|e| EngineError::Inference(format!("failed to extract sequence: {}", e)))?;

        let map_value = maps
            .first()
            .ok_or_else(|| EngineError::Inference("empty probability sequence".to_string()))?;

        let kv_pairs = map_value
            .try_extract_key_values::<i64, f32>()
            .map_err(|e| EngineError::Inference(format!("failed to extract map: {}", e)))?;

        let mut probs = [0.0f64; 3];
        for (class_id, prob) in &kv_pairs {
            match *class_id {
                0..=2 => probs[*class_id as usize] = *prob as f64,
                other => warn!(class = other, "Ignoring unexpected class id in model output"),
            }
        }

        debug!(probs = ?probs, "Extracted probabilities from seq(map)");
        Ok(probs)
    }
}

impl Classifier for OnnxClassifier {
    fn predict_class(&self, features: &[f32; FEATURE_COUNT]) -> EngineResult<usize> {
        let input = Self::input_tensor(features)?;

        let mut session = self
            .session
            .write()
            .map_err(|e| EngineError::Inference(format!("model lock poisoned: {}", e)))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input])
            .map_err(|e| EngineError::Inference(e.to_string()))?;

        if let Some(output) = outputs.get(&self.label_output) {
            if let Ok((_, data)) = output.try_extract_tensor::<i64>() {
                if let Some(&class) = data.first() {
                    return Ok(class as usize);
                }
            }
        }

        // Some exports omit the label output; fall back to the arg-max of the
        // probability triple.
        let probs = self.extract_probabilities(&outputs)?;
        let mut best = 0;
        for (i, p) in probs.iter().enumerate() {
            if *p > probs[best] {
                best = i;
            }
        }
        Ok(best)
    }

    fn predict_probabilities(&self, features: &[f32; FEATURE_COUNT]) -> EngineResult<[f64; 3]> {
        let input = Self::input_tensor(features)?;

        let mut session = self
            .session
            .write()
            .map_err(|e| EngineError::Inference(format!("model lock poisoned: {}", e)))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input])
            .map_err(|e| EngineError::Inference(e.to_string()))?;

        self.extract_probabilities(&outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_artifact_is_model_unavailable() {
        let err = OnnxClassifier::load("models/does_not_exist.onnx", 1).unwrap_err();
        assert!(matches!(err, EngineError::ModelUnavailable(_)));
    }
}
