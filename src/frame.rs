use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, Rgb, RgbImage};

use crate::error::Result;

/// A single 3-channel RGB raster plus its capture time.
///
/// Frames move between pipeline stages by value; a stage that needs to draw
/// on a frame it does not own clones it first.
#[derive(Debug, Clone)]
pub struct Frame {
    /// RGB pixel data
    pub image: RgbImage,
    /// Wall-clock time the frame was captured (or synthesized)
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self {
            image,
            captured_at: Utc::now(),
        }
    }

    /// Create a black frame of the given size
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(RgbImage::from_pixel(width, height, Rgb([0, 0, 0])))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn resolution(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    /// Encode the frame as a baseline JPEG
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.image.as_raw().len() / 8);
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
        encoder.encode(
            self.image.as_raw(),
            self.image.width(),
            self.image.height(),
            ColorType::Rgb8,
        )?;
        Ok(buf)
    }
}

/// A JPEG-encoded frame ready to be written to clients
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// Monotonic sequence number assigned by the producer
    pub sequence: u64,
    pub captured_at: DateTime<Utc>,
    pub jpeg: Vec<u8>,
}
