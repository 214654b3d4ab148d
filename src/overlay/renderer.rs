use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use tracing::trace;

use super::text::TextPainter;
use crate::config::OverlayConfig;
use crate::detection::Detection;
use crate::frame::Frame;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const GREEN: Rgb<u8> = Rgb([0, 255, 0]);

/// Draws detection boxes, labels and summary text onto frames
#[derive(Debug, Clone)]
pub struct OverlayRenderer {
    painter: TextPainter,
    font_size: f32,
    timezone: Tz,
}

impl OverlayRenderer {
    pub fn new(painter: TextPainter, font_size: f32, timezone: Tz) -> Self {
        Self {
            painter,
            font_size,
            timezone,
        }
    }

    pub fn from_config(config: &OverlayConfig, painter: TextPainter) -> Self {
        Self::new(
            painter,
            config.font_size,
            resolve_timestamp_timezone(&config.timestamp_timezone),
        )
    }

    pub fn painter(&self) -> &TextPainter {
        &self.painter
    }

    /// Draw every detection plus a summary line. Returns the frame untouched
    /// when `detections` is empty.
    pub fn draw_detections(&self, mut frame: Frame, detections: &[Detection], model_name: &str) -> Frame {
        if detections.is_empty() {
            return frame;
        }

        let image = &mut frame.image;
        for detection in detections {
            self.draw_detection(image, detection);
        }

        let summary = format!("Objects: {} | Model: {}", detections.len(), model_name);
        let (_, text_h) = self.painter.measure(self.font_size, &summary);
        let y = image.height() as i32 - 10 - text_h as i32;
        self.painter
            .draw(image, GREEN, 10, y.max(0), self.font_size, &summary);

        trace!("Rendered {} detections", detections.len());
        frame
    }

    fn draw_detection(&self, image: &mut RgbImage, detection: &Detection) {
        let color = class_color(&detection.class_label);
        let bbox = detection.bbox;
        let (x, y) = (bbox.x as i32, bbox.y as i32);

        if bbox.width > 0 && bbox.height > 0 {
            draw_hollow_rect_mut(image, Rect::at(x, y).of_size(bbox.width, bbox.height), color);
            if bbox.width > 2 && bbox.height > 2 {
                draw_hollow_rect_mut(
                    image,
                    Rect::at(x + 1, y + 1).of_size(bbox.width - 2, bbox.height - 2),
                    color,
                );
            }
        }

        // Label sits on a filled tab above the box, or inside it at the top edge
        let label = format!("{}: {:.2}", detection.class_label, detection.confidence);
        let (text_w, text_h) = self.painter.measure(self.font_size, &label);
        let tab_h = text_h + 10;
        let tab_y = if y >= tab_h as i32 { y - tab_h as i32 } else { y };
        if text_w > 0 {
            draw_filled_rect_mut(image, Rect::at(x, tab_y).of_size(text_w, tab_h), color);
        }
        self.painter
            .draw(image, WHITE, x, tab_y + 5, self.font_size, &label);

        let (cx, cy) = detection.center;
        draw_filled_circle_mut(image, (cx as i32, cy as i32), 3, color);
    }

    /// Burn a capture timestamp, and the object count while scanning, into a still frame
    pub fn annotate_capture(
        &self,
        mut frame: Frame,
        at: DateTime<Utc>,
        object_count: Option<usize>,
    ) -> Frame {
        let local = at.with_timezone(&self.timezone);
        let header = format!("AI Scanner - {}", local.format("%Y-%m-%d %H:%M:%S"));
        let size = self.font_size * 1.4;
        let (_, line_h) = self.painter.measure(size, &header);

        self.painter.draw(&mut frame.image, GREEN, 10, 10, size, &header);
        if let Some(count) = object_count {
            let line = format!("Objects: {}", count);
            self.painter.draw(
                &mut frame.image,
                GREEN,
                10,
                20 + line_h as i32,
                size,
                &line,
            );
        }

        frame
    }
}

/// Deterministic per-class color: FNV-1a of the label picks a hue
pub fn class_color(label: &str) -> Rgb<u8> {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in label.as_bytes() {
        hash ^= *byte as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }

    let hue = (hash % 360) as f32;
    hsv_to_rgb(hue, 0.85, 0.95)
}

fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> Rgb<u8> {
    let c = value * saturation;
    let h = hue / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = value - c;
    let to_u8 = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb([to_u8(r), to_u8(g), to_u8(b)])
}

/// Resolve configured timezone, falling back to UTC on parse errors
pub(crate) fn resolve_timestamp_timezone(tz_name: &str) -> Tz {
    match tz_name.parse::<Tz>() {
        Ok(tz) => tz,
        Err(_) => {
            tracing::warn!(
                "Invalid timestamp timezone '{}', falling back to UTC",
                tz_name
            );
            chrono_tz::UTC
        }
    }
}
