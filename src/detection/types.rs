use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::PathBuf;

/// Axis-aligned box in pixel coordinates, serialized as `[x, y, w, h]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Computes the intersection area between this bounding box and another
    pub fn intersect(&self, other: &BoundingBox) -> u64 {
        let left = self.x.max(other.x);
        let right = self.right().min(other.right());
        let top = self.y.max(other.y);
        let bottom = self.bottom().min(other.bottom());
        right.saturating_sub(left) as u64 * bottom.saturating_sub(top) as u64
    }

    /// Intersection over union; zero when both boxes are empty
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let intersection = self.intersect(other);
        let union = self.area() + other.area() - intersection;
        if union == 0 {
            0.0
        } else {
            intersection as f32 / union as f32
        }
    }
}

impl Serialize for BoundingBox {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.x, self.y, self.width, self.height].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BoundingBox {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [x, y, width, height] = <[u32; 4]>::deserialize(deserializer)?;
        Ok(Self::new(x, y, width, height))
    }
}

/// One detected object. Built once by the engine and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "class")]
    pub class_label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
    pub area: u64,
    pub center: (u32, u32),
    #[serde(rename = "timestamp")]
    pub detected_at: DateTime<Utc>,
}

impl Detection {
    pub fn new<S: Into<String>>(
        class_label: S,
        confidence: f32,
        bbox: BoundingBox,
        detected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            class_label: class_label.into(),
            confidence,
            bbox,
            area: bbox.area(),
            center: bbox.center(),
            detected_at,
        }
    }
}

/// Where a model runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeBackend {
    Cpu,
    Gpu,
}

/// How a frame is fitted into the model's square input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputConvention {
    /// Resize to the input size, ignoring aspect ratio
    Stretch,
    /// Scale preserving aspect ratio and pad the remainder
    Letterbox,
}

/// Row format a model's backend emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputLayout {
    /// `[cx, cy, w, h, objectness, class scores...]`, normalized center/size
    Darknet,
    /// `[image_id, class_id, confidence, x1, y1, x2, y2]`, normalized corners
    Ssd,
}

impl OutputLayout {
    /// Smallest row width this layout can be decoded from
    pub fn min_columns(self) -> usize {
        match self {
            OutputLayout::Darknet => DARKNET_SCORE_OFFSET + 1,
            OutputLayout::Ssd => SSD_ROW_WIDTH,
        }
    }
}

/// Column where class scores begin in a darknet row
pub const DARKNET_SCORE_OFFSET: usize = 5;

/// Columns in one SSD detection row
pub const SSD_ROW_WIDTH: usize = 7;

/// Everything needed to load and drive one model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelDescriptor {
    pub name: String,
    pub display_name: String,
    pub config_path: PathBuf,
    pub weights_path: PathBuf,
    pub class_labels: Vec<String>,
    pub backend: ComputeBackend,
    /// Model input (width, height)
    pub input_size: (u32, u32),
    /// Pixel normalization: (value - mean) * scale
    pub scale: f32,
    pub mean: f32,
    pub convention: InputConvention,
    pub output_layout: OutputLayout,
}

impl ModelDescriptor {
    pub fn label(&self, class_id: usize) -> String {
        self.class_labels
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{}", class_id))
    }
}
