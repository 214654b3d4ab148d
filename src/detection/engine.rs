use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use super::backend::{InferenceBackend, ModelLoader};
use super::models::find_model;
use super::postprocess::{decode_candidates, non_max_suppression};
use super::preprocess::frame_to_tensor;
use super::types::{ComputeBackend, Detection, ModelDescriptor};
use crate::config::DetectionConfig;
use crate::error::{DetectionError, ScannerError};
use crate::frame::Frame;
use crate::overlay::OverlayRenderer;

/// A model that finished loading and can serve inference
pub struct LoadedModel {
    pub descriptor: ModelDescriptor,
    backend: Box<dyn InferenceBackend>,
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Owns the active model and turns frames into detections.
///
/// The active model is swapped as a whole `Arc`; an inference already in
/// flight keeps the model it started with. Thresholds take effect on the
/// next call.
pub struct DetectionEngine {
    loader: Arc<dyn ModelLoader>,
    model_dir: PathBuf,
    fallback_model: String,
    prefer_gpu: bool,
    renderer: OverlayRenderer,
    active: RwLock<Option<Arc<LoadedModel>>>,
    confidence_threshold: AtomicU32,
    nms_threshold: AtomicU32,
    /// Serializes model loads so concurrent change requests cannot interleave
    switch_lock: Mutex<()>,
}

impl DetectionEngine {
    /// Create an engine with no model loaded
    pub fn new(config: &DetectionConfig, loader: Arc<dyn ModelLoader>, renderer: OverlayRenderer) -> Self {
        Self {
            loader,
            model_dir: PathBuf::from(&config.model_dir),
            fallback_model: config.fallback_model.clone(),
            prefer_gpu: config.prefer_gpu,
            renderer,
            active: RwLock::new(None),
            confidence_threshold: AtomicU32::new(config.confidence_threshold.to_bits()),
            nms_threshold: AtomicU32::new(config.nms_threshold.to_bits()),
            switch_lock: Mutex::new(()),
        }
    }

    /// Load a known model, returning whether any model was activated
    pub fn load_model(&self, name: &str) -> bool {
        match self.try_load_model(name) {
            Ok(_) => true,
            Err(e) => {
                warn!("Model change to '{}' failed: {}", name, e);
                false
            }
        }
    }

    /// Load a known model, falling back once to the lightweight model.
    ///
    /// Returns the descriptor of the model that actually became active.
    /// Unknown names are rejected without a fallback attempt. If both loads
    /// fail the previously active model (if any) is left in place.
    pub fn try_load_model(&self, name: &str) -> Result<ModelDescriptor, DetectionError> {
        let primary = find_model(name).ok_or_else(|| DetectionError::UnknownModel {
            name: name.to_string(),
        })?;

        let _switch = self.switch_lock.lock();
        let backend = self.preferred_backend();

        let primary_err = match self.load_descriptor(primary.descriptor(&self.model_dir, backend)) {
            Ok(descriptor) => return Ok(descriptor),
            Err(e) => e,
        };
        warn!("Failed to load model '{}': {}", name, primary_err);

        if self.fallback_model == name {
            return Err(primary_err);
        }
        let Some(fallback) = find_model(&self.fallback_model) else {
            warn!("Fallback model '{}' is not a known model", self.fallback_model);
            return Err(primary_err);
        };

        info!("Trying fallback model '{}'", fallback.name);
        match self.load_descriptor(fallback.descriptor(&self.model_dir, backend)) {
            Ok(descriptor) => Ok(descriptor),
            Err(fallback_err) => {
                warn!("Fallback model '{}' also failed: {}", fallback.name, fallback_err);
                Err(primary_err)
            }
        }
    }

    fn load_descriptor(&self, descriptor: ModelDescriptor) -> Result<ModelDescriptor, DetectionError> {
        let backend = self.loader.load(&descriptor)?;
        let loaded = Arc::new(LoadedModel {
            descriptor: descriptor.clone(),
            backend,
        });
        *self.active.write() = Some(loaded);
        info!(
            "Loaded model '{}' ({}) on {:?}",
            descriptor.name, descriptor.display_name, descriptor.backend
        );
        Ok(descriptor)
    }

    fn preferred_backend(&self) -> ComputeBackend {
        if self.prefer_gpu && self.loader.gpu_available() {
            ComputeBackend::Gpu
        } else {
            ComputeBackend::Cpu
        }
    }

    /// Detect objects in a frame. Any failure yields an empty list.
    pub fn detect_objects(&self, frame: &Frame) -> Vec<Detection> {
        match self.try_detect(frame) {
            Ok(detections) => detections,
            Err(e) => {
                warn!("Detection skipped for frame: {}", e);
                Vec::new()
            }
        }
    }

    /// Detect objects in a frame, surfacing internal failures
    pub fn try_detect(&self, frame: &Frame) -> Result<Vec<Detection>, DetectionError> {
        let Some(model) = self.active.read().clone() else {
            trace!("No model loaded, skipping detection");
            return Ok(Vec::new());
        };
        let descriptor = &model.descriptor;

        let (input, transform) = frame_to_tensor(frame, descriptor)?;
        let output = model.backend.forward(&input)?;
        let layout = descriptor.output_layout;
        if output.nrows() > 0 && output.ncols() < layout.min_columns() {
            return Err(DetectionError::Inference {
                details: format!(
                    "{:?} output rows have {} columns, expected at least {}",
                    layout,
                    output.ncols(),
                    layout.min_columns()
                ),
            });
        }

        let confidence = self.confidence_threshold();
        let candidates = decode_candidates(output.view(), layout, confidence, &transform);
        let total = candidates.len();
        let survivors = non_max_suppression(candidates, self.nms_threshold());
        debug!(
            "{} candidates above {:.2}, {} after NMS",
            total,
            confidence,
            survivors.len()
        );

        let detected_at = Utc::now();
        Ok(survivors
            .into_iter()
            .map(|c| Detection::new(descriptor.label(c.class_id), c.confidence, c.bbox, detected_at))
            .collect())
    }

    /// Draw boxes, labels and the summary line for `detections`
    pub fn draw_detections(&self, frame: Frame, detections: &[Detection]) -> Frame {
        if detections.is_empty() {
            return frame;
        }
        let model_name = self.current_model_name().unwrap_or_else(|| "none".to_string());
        self.renderer.draw_detections(frame, detections, &model_name)
    }

    pub fn renderer(&self) -> &OverlayRenderer {
        &self.renderer
    }

    pub fn confidence_threshold(&self) -> f32 {
        f32::from_bits(self.confidence_threshold.load(Ordering::Acquire))
    }

    /// Callers validate the range first (see [`validate_threshold`])
    pub fn set_confidence_threshold(&self, threshold: f32) {
        self.confidence_threshold
            .store(threshold.to_bits(), Ordering::Release);
        info!("Confidence threshold set to {:.2}", threshold);
    }

    pub fn nms_threshold(&self) -> f32 {
        f32::from_bits(self.nms_threshold.load(Ordering::Acquire))
    }

    pub fn set_nms_threshold(&self, threshold: f32) {
        self.nms_threshold.store(threshold.to_bits(), Ordering::Release);
    }

    pub fn current_model_name(&self) -> Option<String> {
        self.active.read().as_ref().map(|m| m.descriptor.name.clone())
    }

    pub fn active_descriptor(&self) -> Option<ModelDescriptor> {
        self.active.read().as_ref().map(|m| m.descriptor.clone())
    }

    pub fn has_model(&self) -> bool {
        self.active.read().is_some()
    }

    pub fn gpu_available(&self) -> bool {
        self.loader.gpu_available()
    }
}

/// Parse and range-check a threshold given as request text
pub fn validate_threshold(name: &str, raw: &str) -> Result<f32, ScannerError> {
    let value: f32 = raw
        .trim()
        .parse()
        .map_err(|_| ScannerError::invalid_parameter(name, format!("'{}' is not a number", raw)))?;

    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ScannerError::invalid_parameter(
            name,
            format!("{} is outside [0, 1]", value),
        ));
    }

    Ok(value)
}
