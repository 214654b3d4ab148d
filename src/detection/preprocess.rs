use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use ndarray::Array4;

use super::types::{InputConvention, ModelDescriptor};
use crate::error::DetectionError;
use crate::frame::Frame;

const LETTERBOX_FILL: u8 = 114;

/// Maps model-space normalized boxes back into source frame pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputTransform {
    /// Source frame size
    pub frame_size: (u32, u32),
    /// Model input size
    pub input_size: (u32, u32),
    /// Source-to-model scale factor (letterbox only; 1.0 for stretch)
    pub scale: f32,
    /// Padding added on the left and top of the model input
    pub pad: (f32, f32),
    pub convention: InputConvention,
}

impl InputTransform {
    /// Convert a normalized center/size box into frame-space `(cx, cy, w, h)` pixels
    pub fn to_frame(&self, cx: f32, cy: f32, w: f32, h: f32) -> (f32, f32, f32, f32) {
        let (fw, fh) = (self.frame_size.0 as f32, self.frame_size.1 as f32);
        match self.convention {
            InputConvention::Stretch => (cx * fw, cy * fh, w * fw, h * fh),
            InputConvention::Letterbox => {
                let (iw, ih) = (self.input_size.0 as f32, self.input_size.1 as f32);
                (
                    (cx * iw - self.pad.0) / self.scale,
                    (cy * ih - self.pad.1) / self.scale,
                    w * iw / self.scale,
                    h * ih / self.scale,
                )
            }
        }
    }
}

/// Resize and normalize a frame into a `1x3xHxW` tensor for the given model
pub fn frame_to_tensor(
    frame: &Frame,
    descriptor: &ModelDescriptor,
) -> Result<(Array4<f32>, InputTransform), DetectionError> {
    if frame.is_empty() {
        return Err(DetectionError::InvalidFrame {
            details: "frame has zero width or height".to_string(),
        });
    }

    let (in_w, in_h) = descriptor.input_size;
    if in_w == 0 || in_h == 0 {
        return Err(DetectionError::InvalidFrame {
            details: format!("model '{}' declares an empty input size", descriptor.name),
        });
    }

    let (resized, transform) = match descriptor.convention {
        InputConvention::Stretch => (
            imageops::resize(&frame.image, in_w, in_h, FilterType::Triangle),
            InputTransform {
                frame_size: frame.resolution(),
                input_size: (in_w, in_h),
                scale: 1.0,
                pad: (0.0, 0.0),
                convention: InputConvention::Stretch,
            },
        ),
        InputConvention::Letterbox => letterbox(frame, in_w, in_h),
    };

    let mut tensor = Array4::<f32>::zeros((1, 3, in_h as usize, in_w as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] =
                (pixel[c] as f32 - descriptor.mean) * descriptor.scale;
        }
    }

    Ok((tensor, transform))
}

fn letterbox(frame: &Frame, in_w: u32, in_h: u32) -> (RgbImage, InputTransform) {
    let (fw, fh) = frame.resolution();
    let scale = (in_w as f32 / fw as f32).min(in_h as f32 / fh as f32);
    let new_w = ((fw as f32 * scale).round() as u32).clamp(1, in_w);
    let new_h = ((fh as f32 * scale).round() as u32).clamp(1, in_h);
    let pad_x = (in_w - new_w) / 2;
    let pad_y = (in_h - new_h) / 2;

    let resized = imageops::resize(&frame.image, new_w, new_h, FilterType::Triangle);
    let mut canvas = RgbImage::from_pixel(in_w, in_h, Rgb([LETTERBOX_FILL; 3]));
    imageops::replace(&mut canvas, &resized, pad_x as i64, pad_y as i64);

    (
        canvas,
        InputTransform {
            frame_size: (fw, fh),
            input_size: (in_w, in_h),
            scale,
            pad: (pad_x as f32, pad_y as f32),
            convention: InputConvention::Letterbox,
        },
    )
}
