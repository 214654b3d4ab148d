mod backend;
mod engine;
mod models;
mod postprocess;
mod preprocess;
mod types;

pub use backend::{InferenceBackend, ModelLoader, NoRuntimeLoader};
pub use engine::{validate_threshold, DetectionEngine, LoadedModel};
pub use models::{find_model, ModelSpec, COCO_CLASSES, KNOWN_MODELS, VOC_CLASSES};
pub use postprocess::{decode_candidates, non_max_suppression, Candidate};
pub use preprocess::{frame_to_tensor, InputTransform};
pub use types::{
    BoundingBox, ComputeBackend, Detection, InputConvention, ModelDescriptor, OutputLayout,
    DARKNET_SCORE_OFFSET, SSD_ROW_WIDTH,
};
