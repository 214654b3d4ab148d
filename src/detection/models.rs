use std::path::Path;

use super::types::{ComputeBackend, InputConvention, ModelDescriptor, OutputLayout};

/// Static description of a model the engine knows how to load
#[derive(Debug, Clone, Copy)]
pub struct ModelSpec {
    pub name: &'static str,
    pub display_name: &'static str,
    pub config_file: &'static str,
    pub weights_file: &'static str,
    pub input_size: (u32, u32),
    pub scale: f32,
    pub mean: f32,
    pub convention: InputConvention,
    pub output_layout: OutputLayout,
    pub labels: &'static [&'static str],
}

impl ModelSpec {
    /// Resolve file paths under `model_dir` and build the runtime descriptor
    pub fn descriptor(&self, model_dir: &Path, backend: ComputeBackend) -> ModelDescriptor {
        ModelDescriptor {
            name: self.name.to_string(),
            display_name: self.display_name.to_string(),
            config_path: model_dir.join(self.config_file),
            weights_path: model_dir.join(self.weights_file),
            class_labels: self.labels.iter().map(|l| l.to_string()).collect(),
            backend,
            input_size: self.input_size,
            scale: self.scale,
            mean: self.mean,
            convention: self.convention,
            output_layout: self.output_layout,
        }
    }
}

pub const KNOWN_MODELS: &[ModelSpec] = &[
    ModelSpec {
        name: "yolov3",
        display_name: "YOLOv3 (Balanced)",
        config_file: "yolov3.cfg",
        weights_file: "yolov3.weights",
        input_size: (416, 416),
        scale: 1.0 / 255.0,
        mean: 0.0,
        convention: InputConvention::Stretch,
        output_layout: OutputLayout::Darknet,
        labels: COCO_CLASSES,
    },
    ModelSpec {
        name: "yolov3-tiny",
        display_name: "YOLOv3 Tiny (Fast)",
        config_file: "yolov3-tiny.cfg",
        weights_file: "yolov3-tiny.weights",
        input_size: (416, 416),
        scale: 1.0 / 255.0,
        mean: 0.0,
        convention: InputConvention::Stretch,
        output_layout: OutputLayout::Darknet,
        labels: COCO_CLASSES,
    },
    ModelSpec {
        name: "yolov4",
        display_name: "YOLOv4 (Fastest)",
        config_file: "yolov4.cfg",
        weights_file: "yolov4.weights",
        input_size: (416, 416),
        scale: 1.0 / 255.0,
        mean: 0.0,
        convention: InputConvention::Stretch,
        output_layout: OutputLayout::Darknet,
        labels: COCO_CLASSES,
    },
    ModelSpec {
        name: "yolov4-tiny",
        display_name: "YOLOv4 Tiny (Fast)",
        config_file: "yolov4-tiny.cfg",
        weights_file: "yolov4-tiny.weights",
        input_size: (416, 416),
        scale: 1.0 / 255.0,
        mean: 0.0,
        convention: InputConvention::Stretch,
        output_layout: OutputLayout::Darknet,
        labels: COCO_CLASSES,
    },
    ModelSpec {
        name: "ssd_mobilenet",
        display_name: "SSD MobileNet (Lightweight)",
        config_file: "MobileNetSSD_deploy.prototxt",
        weights_file: "MobileNetSSD_deploy.caffemodel",
        input_size: (300, 300),
        scale: 0.007_843,
        mean: 127.5,
        convention: InputConvention::Stretch,
        output_layout: OutputLayout::Ssd,
        labels: VOC_CLASSES,
    },
];

/// Look up a known model by name
pub fn find_model(name: &str) -> Option<&'static ModelSpec> {
    KNOWN_MODELS.iter().find(|model| model.name == name)
}

pub const COCO_CLASSES: &[&str] = &[
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich",
    "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch",
    "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote",
    "keyboard", "cell phone", "microwave", "oven", "toaster", "sink", "refrigerator", "book",
    "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

pub const VOC_CLASSES: &[&str] = &[
    "background", "aeroplane", "bicycle", "bird", "boat", "bottle", "bus", "car", "cat",
    "chair", "cow", "diningtable", "dog", "horse", "motorbike", "person", "pottedplant",
    "sheep", "sofa", "train", "tvmonitor",
];
