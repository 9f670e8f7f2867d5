//! Classifier seam
//!
//! The pipeline only needs one capability from a trained model: score a
//! spectrogram. Anything implementing [`Classifier`] can be plugged in; the
//! `onnx` feature provides an ONNX Runtime backed implementation.

use crate::config::ModelConfig;
use crate::error::{DrumError, Result as DrumErrorResult};
use crate::spectral::Spectrogram;
use std::path::Path;

/// A trained model that scores drum spectrograms.
///
/// Returns one score per class in [`crate::analysis::DrumClass`] order. The
/// pipeline does not validate the output length here; the translator turns
/// malformed output into [`crate::analysis::Label::NoPrediction`].
///
/// `predict` takes `&mut self`; sharing one instance across threads needs
/// external locking.
pub trait Classifier {
    fn predict(&mut self, spectrogram: &Spectrogram) -> DrumErrorResult<Vec<f32>>;
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn predict(&mut self, spectrogram: &Spectrogram) -> DrumErrorResult<Vec<f32>> {
        (**self).predict(spectrogram)
    }
}

impl<C: Classifier + ?Sized> Classifier for &mut C {
    fn predict(&mut self, spectrogram: &Spectrogram) -> DrumErrorResult<Vec<f32>> {
        (**self).predict(spectrogram)
    }
}

/// Load the classifier described by the model configuration
pub fn load_classifier(config: &ModelConfig) -> DrumErrorResult<Box<dyn Classifier>> {
    let path = config
        .path
        .as_ref()
        .ok_or_else(|| DrumError::ModelLoad("no model path configured".to_string()))?;

    if !path.exists() {
        return Err(DrumError::ModelLoad(format!(
            "Model file not found: {}",
            path.display()
        )));
    }

    load_backend(path, config)
}

#[cfg(feature = "onnx")]
fn load_backend(path: &Path, config: &ModelConfig) -> DrumErrorResult<Box<dyn Classifier>> {
    Ok(Box::new(onnx::OnnxClassifier::load(path, config)?))
}

#[cfg(not(feature = "onnx"))]
fn load_backend(path: &Path, _config: &ModelConfig) -> DrumErrorResult<Box<dyn Classifier>> {
    Err(DrumError::ModelLoad(format!(
        "cannot load {}: built without the `onnx` feature",
        path.display()
    )))
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;

#[cfg(feature = "onnx")]
mod onnx {
    use super::Classifier;
    use crate::config::ModelConfig;
    use crate::error::{DrumError, Result as DrumErrorResult};
    use crate::spectral::Spectrogram;
    use ort::session::{builder::GraphOptimizationLevel, Session};
    use ort::value::Value;
    use std::path::Path;
    use tracing::{debug, info};

    /// Classifier backed by an ONNX Runtime session
    pub struct OnnxClassifier {
        session: Session,
        input_name: String,
        output_name: String,
    }

    impl OnnxClassifier {
        pub fn load<P: AsRef<Path>>(path: P, config: &ModelConfig) -> DrumErrorResult<Self> {
            let path = path.as_ref();

            let session = Session::builder()
                .map_err(|e| {
                    DrumError::ModelLoad(format!("Failed to create session builder: {}", e))
                })?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(|e| {
                    DrumError::ModelLoad(format!("Failed to set optimization level: {}", e))
                })?
                .with_intra_threads(config.intra_threads)
                .map_err(|e| DrumError::ModelLoad(format!("Failed to set threads: {}", e)))?
                .commit_from_file(path)
                .map_err(|e| DrumError::ModelLoad(format!("Failed to load model: {}", e)))?;

            if !session.inputs.iter().any(|i| i.name == config.input_name) {
                return Err(DrumError::ModelLoad(format!(
                    "model has no input named '{}'",
                    config.input_name
                )));
            }

            let output_name = match &config.output_name {
                Some(name) => {
                    if !session.outputs.iter().any(|o| &o.name == name) {
                        return Err(DrumError::ModelLoad(format!(
                            "model has no output named '{}'",
                            name
                        )));
                    }
                    name.clone()
                }
                None => session
                    .outputs
                    .first()
                    .map(|o| o.name.clone())
                    .ok_or_else(|| DrumError::ModelLoad("model has no outputs".to_string()))?,
            };

            info!(
                "Loaded model {} (input '{}', output '{}')",
                path.display(),
                config.input_name,
                output_name
            );

            Ok(Self {
                session,
                input_name: config.input_name.clone(),
                output_name,
            })
        }
    }

    impl Classifier for OnnxClassifier {
        fn predict(&mut self, spectrogram: &Spectrogram) -> DrumErrorResult<Vec<f32>> {
            let input = Value::from_array(spectrogram.data().clone()).map_err(|e| {
                DrumError::ModelInference(format!("Failed to create input tensor: {}", e))
            })?;

            let outputs = self
                .session
                .run(ort::inputs![self.input_name.as_str() => input])
                .map_err(|e| DrumError::ModelInference(format!("Inference failed: {}", e)))?;

            let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
                DrumError::ModelInference(format!("Missing '{}' in results", self.output_name))
            })?;
            let (_, scores) = output.try_extract_tensor::<f32>().map_err(|e| {
                DrumError::ModelInference(format!("Failed to extract output: {}", e))
            })?;

            debug!("Model scores: {:?}", scores);
            Ok(scores.to_vec())
        }
    }
}
