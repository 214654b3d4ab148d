use super::*;
use crate::detection::{BoundingBox, Detection};
use crate::frame::Frame;
use chrono::Utc;
use image::Rgb;

fn renderer() -> OverlayRenderer {
    OverlayRenderer::new(TextPainter::disabled(), 16.0, chrono_tz::UTC)
}

fn detection(label: &str, bbox: BoundingBox) -> Detection {
    Detection::new(label, 0.9, bbox, Utc::now())
}

#[test]
fn test_class_color_is_stable() {
    assert_eq!(class_color("person"), class_color("person"));
    assert_eq!(class_color("dog"), class_color(&"dog".to_string()));
}

#[test]
fn test_class_color_differs_between_classes() {
    let labels = ["person", "car", "dog", "chair", "laptop"];
    let distinct: std::collections::HashSet<_> =
        labels.iter().map(|l| class_color(l).0).collect();
    assert!(distinct.len() > 1);
}

#[test]
fn test_empty_detections_leave_frame_unchanged() {
    let frame = Frame::blank(64, 48);
    let original = frame.image.clone();

    let out = renderer().draw_detections(frame, &[], "yolov3");
    assert_eq!(out.image, original);
}

#[test]
fn test_draw_detection_box_edges() {
    let frame = Frame::blank(100, 100);
    let det = detection("person", BoundingBox::new(20, 30, 40, 50));
    let color = class_color("person");

    let out = renderer().draw_detections(frame, &[det], "yolov3");

    // Left and bottom edges carry the class color
    assert_eq!(out.image.get_pixel(20, 60), &color);
    assert_eq!(out.image.get_pixel(40, 79), &color);
    // Interior away from the center marker stays black
    assert_eq!(out.image.get_pixel(30, 70), &Rgb([0, 0, 0]));
    // Center marker
    assert_eq!(out.image.get_pixel(40, 55), &color);
}

#[test]
fn test_draw_detection_touching_frame_edge() {
    let frame = Frame::blank(50, 50);
    let det = detection("car", BoundingBox::new(0, 0, 50, 50));

    let out = renderer().draw_detections(frame, &[det], "yolov3");
    assert_eq!(out.resolution(), (50, 50));
    assert_eq!(out.image.get_pixel(0, 49), &class_color("car"));
}

#[test]
fn test_annotate_capture_without_font_keeps_size() {
    let frame = Frame::blank(80, 60);
    let out = renderer().annotate_capture(frame, Utc::now(), Some(3));
    assert_eq!(out.resolution(), (80, 60));
}

#[test]
fn test_missing_font_disables_text() {
    let painter = TextPainter::load("/nonexistent/font.ttf");
    assert!(!painter.has_font());

    let (w, h) = painter.measure(10.0, "abcd");
    assert_eq!((w, h), (20, 10));
}

#[test]
fn test_invalid_timezone_falls_back_to_utc() {
    assert_eq!(resolve_timestamp_timezone("Not/AZone"), chrono_tz::UTC);
    assert_eq!(
        resolve_timestamp_timezone("Europe/Berlin"),
        chrono_tz::Europe::Berlin
    );
}
