use ndarray::{Array2, Array4};
use tracing::debug;

use super::types::ModelDescriptor;
use crate::error::DetectionError;

/// A loaded network: NCHW float tensor in, one row per candidate out.
///
/// Rows follow the descriptor's `output_layout`: darknet rows for the YOLO
/// family, `[image_id, class_id, confidence, x1, y1, x2, y2]` for SSD.
pub trait InferenceBackend: Send + Sync {
    fn forward(&self, input: &Array4<f32>) -> Result<Array2<f32>, DetectionError>;
}

/// Turns a model descriptor into a runnable backend
pub trait ModelLoader: Send + Sync {
    fn load(&self, descriptor: &ModelDescriptor) -> Result<Box<dyn InferenceBackend>, DetectionError>;

    /// Whether GPU execution is available to loaded models
    fn gpu_available(&self) -> bool {
        false
    }
}

/// Loader used when no inference runtime is linked into the build.
///
/// Reports missing model files first so operators can tell the two failure
/// modes apart; every load fails, leaving the scanner in stream-only mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRuntimeLoader;

impl ModelLoader for NoRuntimeLoader {
    fn load(&self, descriptor: &ModelDescriptor) -> Result<Box<dyn InferenceBackend>, DetectionError> {
        for path in [&descriptor.config_path, &descriptor.weights_path] {
            if !path.exists() {
                return Err(DetectionError::ModelLoad {
                    name: descriptor.name.clone(),
                    details: format!("model file not found: {}", path.display()),
                });
            }
        }

        debug!(
            "Model files for '{}' present but no inference runtime is available",
            descriptor.name
        );
        Err(DetectionError::ModelLoad {
            name: descriptor.name.clone(),
            details: "no inference runtime linked into this build".to_string(),
        })
    }
}
