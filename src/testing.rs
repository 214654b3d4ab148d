//! Scripted stand-ins for the capture device and the inference runtime.

use ndarray::{Array2, Array4};
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::camera::CaptureDevice;
use crate::detection::{InferenceBackend, ModelDescriptor, ModelLoader, DARKNET_SCORE_OFFSET};
use crate::error::{CameraError, DetectionError};
use crate::frame::Frame;

/// Number of class columns in scripted output rows
pub const SCRIPTED_CLASSES: usize = 3;

/// One darknet-style output row with a single non-zero class score
pub fn darknet_row(cx: f32, cy: f32, w: f32, h: f32, class_id: usize, score: f32) -> Vec<f32> {
    let mut row = vec![0.0; DARKNET_SCORE_OFFSET + SCRIPTED_CLASSES];
    row[0] = cx;
    row[1] = cy;
    row[2] = w;
    row[3] = h;
    row[4] = score;
    row[DARKNET_SCORE_OFFSET + class_id] = score;
    row
}

pub fn rows(rows: &[Vec<f32>]) -> Array2<f32> {
    let width = rows.first().map_or(DARKNET_SCORE_OFFSET + SCRIPTED_CLASSES, Vec::len);
    let flat: Vec<f32> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), width), flat).unwrap_or_else(|_| Array2::zeros((0, width)))
}

/// Backend that ignores its input and replays a fixed result
pub struct ScriptedBackend {
    output: std::result::Result<Array2<f32>, String>,
}

impl InferenceBackend for ScriptedBackend {
    fn forward(&self, _input: &Array4<f32>) -> std::result::Result<Array2<f32>, DetectionError> {
        self.output
            .clone()
            .map_err(|details| DetectionError::Inference { details })
    }
}

/// Loader that succeeds only for an allow-listed set of model names
pub struct ScriptedLoader {
    loadable: HashSet<String>,
    output: Mutex<std::result::Result<Array2<f32>, String>>,
    gpu: bool,
    attempts: Mutex<Vec<ModelDescriptor>>,
}

impl ScriptedLoader {
    pub fn new(loadable: &[&str], output: Array2<f32>) -> Self {
        Self {
            loadable: loadable.iter().map(|s| s.to_string()).collect(),
            output: Mutex::new(Ok(output)),
            gpu: false,
            attempts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_inference(loadable: &[&str], details: &str) -> Self {
        let loader = Self::new(loadable, Array2::zeros((0, DARKNET_SCORE_OFFSET + 1)));
        *loader.output.lock() = Err(details.to_string());
        loader
    }

    pub fn with_gpu(mut self) -> Self {
        self.gpu = true;
        self
    }

    /// Output handed to backends loaded after this call
    pub fn set_output(&self, output: Array2<f32>) {
        *self.output.lock() = Ok(output);
    }

    pub fn attempts(&self) -> Vec<ModelDescriptor> {
        self.attempts.lock().clone()
    }
}

impl ModelLoader for ScriptedLoader {
    fn load(
        &self,
        descriptor: &ModelDescriptor,
    ) -> std::result::Result<Box<dyn InferenceBackend>, DetectionError> {
        self.attempts.lock().push(descriptor.clone());
        if !self.loadable.contains(&descriptor.name) {
            return Err(DetectionError::ModelLoad {
                name: descriptor.name.clone(),
                details: "scripted failure".to_string(),
            });
        }
        Ok(Box::new(ScriptedBackend {
            output: self.output.lock().clone(),
        }))
    }

    fn gpu_available(&self) -> bool {
        self.gpu
    }
}

/// Capture device that replays queued reads, then fails every read
pub struct ScriptedDevice {
    open_ok: bool,
    reads: VecDeque<Option<Frame>>,
    repeat_last: Option<Frame>,
    pub closes: Arc<AtomicUsize>,
}

impl ScriptedDevice {
    /// A device that opens and returns `frame` on every read
    pub fn steady(frame: Frame) -> Self {
        Self {
            open_ok: true,
            reads: VecDeque::new(),
            repeat_last: Some(frame),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A device that opens and plays `reads` in order; `None` is a failed read
    pub fn sequence(reads: Vec<Option<Frame>>) -> Self {
        Self {
            open_ok: true,
            reads: reads.into(),
            repeat_last: None,
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn unopenable() -> Self {
        Self {
            open_ok: false,
            reads: VecDeque::new(),
            repeat_last: None,
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn close_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }
}

impl CaptureDevice for ScriptedDevice {
    fn open(&mut self, index: u32, _resolution: (u32, u32), _fps: u32) -> std::result::Result<(), CameraError> {
        if self.open_ok {
            Ok(())
        } else {
            Err(CameraError::DeviceOpen {
                index,
                details: "scripted device absent".to_string(),
            })
        }
    }

    fn read_frame(&mut self) -> std::result::Result<Frame, CameraError> {
        let next = match self.reads.pop_front() {
            Some(read) => read,
            None => self.repeat_last.clone(),
        };
        next.ok_or_else(|| CameraError::ReadFailed {
            details: "scripted read failure".to_string(),
        })
    }

    fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
