use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;

use crate::frame::Frame;
use crate::overlay::TextPainter;

const MARKER_RADIUS: i32 = 30;
const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
const DIM_GREEN: Rgb<u8> = Rgb([0, 200, 0]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Center of the simulated object at `t` seconds
pub fn fallback_marker_position(width: u32, height: u32, t: f64) -> (i32, i32) {
    let x = width as f64 / 2.0 + t.sin() * 100.0;
    let y = height as f64 / 2.0 + (t * 0.7).cos() * 80.0;
    (x as i32, y as i32)
}

/// Placeholder frame shown while no camera is connected.
///
/// A "no camera" notice plus a marker that moves with `t`, so viewers can
/// tell the stream is live.
pub fn render_fallback_frame(width: u32, height: u32, t: f64, painter: &TextPainter) -> Frame {
    let mut image = RgbImage::new(width, height);

    painter.draw(&mut image, GREEN, 100, 180, 32.0, "CAMERA NOT AVAILABLE");
    painter.draw(&mut image, DIM_GREEN, 120, 225, 22.0, "Using simulated feed");

    let (x, y) = fallback_marker_position(width, height, t);
    draw_filled_circle_mut(&mut image, (x, y), MARKER_RADIUS, GREEN);
    painter.draw(&mut image, BLACK, x - 40, y - 52, 16.0, "SIM OBJECT");

    Frame::new(image)
}
