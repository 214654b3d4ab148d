use super::*;
use crate::camera::CameraStatus;
use crate::config::ScannerConfig;
use crate::detection::{BoundingBox, Detection, DetectionEngine};
use crate::frame::Frame;
use crate::overlay::{OverlayRenderer, TextPainter};
use crate::pipeline::FrameFeed;
use crate::state::DetectionStateStore;
use crate::testing::{darknet_row, rows, ScriptedLoader};
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    state: ServerState,
}

impl TestApp {
    fn new(loadable: &[&str]) -> Self {
        let config = ScannerConfig::default();
        let output = rows(&[darknet_row(0.5, 0.5, 0.25, 0.25, 0, 0.9)]);
        let loader = Arc::new(ScriptedLoader::new(loadable, output));
        let renderer = OverlayRenderer::new(TextPainter::disabled(), 16.0, chrono_tz::UTC);
        let engine = Arc::new(DetectionEngine::new(&config.detection, loader, renderer));

        let state = ServerState::new(
            engine,
            DetectionStateStore::new(),
            Arc::new(FrameFeed::new()),
            CameraStatus::new((640, 480)),
            config.stream.jpeg_quality,
        );
        Self { state }
    }

    fn router(&self) -> Router {
        router(self.state.clone())
    }

    async fn get(&self, uri: &str) -> (StatusCode, Vec<u8>, axum::http::HeaderMap) {
        let response = self
            .router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec(), headers)
    }

    async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let (status, body, _) = self.get(uri).await;
        (status, serde_json::from_slice(&body).unwrap())
    }
}

fn camera_frame() -> Frame {
    Frame::new(image::RgbImage::from_pixel(640, 480, image::Rgb([40, 40, 40])))
}

#[tokio::test]
async fn test_stream_server_builder() {
    let app = TestApp::new(&[]);
    let mut config = ScannerConfig::default().stream;
    config.ip = "127.0.0.1".to_string();
    config.port = 8080;

    let server = StreamServerBuilder::new()
        .config(config)
        .engine(app.state.engine.clone())
        .scan_state(app.state.scan_state.clone())
        .feed(app.state.feed.clone())
        .camera_status(app.state.camera.clone())
        .build()
        .unwrap();

    assert_eq!(server.address(), "127.0.0.1:8080");
}

#[tokio::test]
async fn test_stream_server_builder_requires_engine() {
    let result = StreamServerBuilder::new()
        .config(ScannerConfig::default().stream)
        .build();
    assert!(result.is_err());
}

#[tokio::test]
async fn test_start_and_stop_scan_reflected_in_stats() {
    let app = TestApp::new(&[]);

    let (status, body) = app.get_json("/start_scan").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "AI Scanning Started");
    assert!(body["timestamp"].is_string());

    let (_, stats) = app.get_json("/get_stats").await;
    assert_eq!(stats["scan_active"], true);

    let (_, body) = app.get_json("/stop_scan").await;
    assert_eq!(body["message"], "AI Scanning Stopped");
    let (_, stats) = app.get_json("/get_stats").await;
    assert_eq!(stats["scan_active"], false);
}

#[tokio::test]
async fn test_get_stats_fields() {
    let app = TestApp::new(&["yolov3"]);
    assert!(app.state.engine.load_model("yolov3"));

    let (status, stats) = app.get_json("/get_stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["objects_detected"], 0);
    assert_eq!(stats["camera_status"], "disconnected");
    assert_eq!(stats["model"], "yolov3");
    assert_eq!(stats["fps"], 0);
    assert!(stats["uptime"].as_f64().unwrap() >= 0.0);
    assert!((stats["confidence_threshold"].as_f64().unwrap() - 0.5).abs() < 1e-6);
}

#[tokio::test]
async fn test_get_detections_enriches_objects() {
    let app = TestApp::new(&[]);
    let at = Utc::now();
    app.state.scan_state.publish(
        vec![
            Detection::new("person", 0.9, BoundingBox::new(1, 2, 30, 40), at),
            Detection::new("giraffe", 0.7, BoundingBox::new(100, 100, 20, 20), at),
        ],
        at,
    );

    let (status, body) = app.get_json("/get_detections").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["count"], 2);
    assert_eq!(body["scan_active"], false);
    assert!(body["last_scan"].is_string());

    let objects = body["objects"].as_array().unwrap();
    assert_eq!(objects[0]["class"], "person");
    assert_eq!(objects[0]["category"], "Human Being");
    assert_eq!(objects[0]["bbox"], serde_json::json!([1, 2, 30, 40]));
    assert!(objects[0]["scan_time"].is_string());
    assert_eq!(objects[1]["category"], "Unknown Object");
}

#[tokio::test]
async fn test_get_detections_before_any_scan() {
    let app = TestApp::new(&[]);
    let (_, body) = app.get_json("/get_detections").await;
    assert_eq!(body["count"], 0);
    assert!(body["last_scan"].is_null());
}

#[tokio::test]
async fn test_scan_single_without_frame() {
    let app = TestApp::new(&["yolov3"]);
    let (status, body) = app.get_json("/scan_single").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "No camera frame available");
}

#[tokio::test]
async fn test_scan_single_end_to_end() {
    let app = TestApp::new(&["yolov3"]);
    app.state.feed.store_raw(&camera_frame());

    let (status, body) = app.get_json("/scan_single").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);

    let (status, body) = app.get_json("/change_model/yolov3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["model"], "yolov3");

    let (_, body) = app.get_json("/scan_single").await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["count"], 1);

    let object = &body["objects"][0];
    let bbox = object["bbox"].as_array().unwrap();
    assert_eq!(bbox.len(), 4);
    assert!(bbox.iter().all(|v| v.as_u64().is_some()));
    assert!(object["confidence"].as_f64().unwrap() >= 0.5);

    // The single scan also becomes the current batch
    let (_, detections) = app.get_json("/get_detections").await;
    assert_eq!(detections["count"], 1);
}

#[tokio::test]
async fn test_change_model_unknown_name_keeps_model() {
    let app = TestApp::new(&["yolov3"]);
    assert!(app.state.engine.load_model("yolov3"));

    let (status, body) = app.get_json("/change_model/faster_rcnn").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");

    let (_, stats) = app.get_json("/get_stats").await;
    assert_eq!(stats["model"], "yolov3");
}

#[tokio::test]
async fn test_change_model_reports_fallback() {
    let app = TestApp::new(&["ssd_mobilenet"]);

    let (status, body) = app.get_json("/change_model/yolov4").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"], "ssd_mobilenet");
    assert_eq!(body["requested"], "yolov4");
    assert_eq!(body["fallback_used"], true);
    assert_eq!(body["message"], "Model changed to SSD MobileNet (Lightweight)");
}

#[tokio::test]
async fn test_change_model_load_failure() {
    let app = TestApp::new(&[]);

    let (status, body) = app.get_json("/change_model/yolov3").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");

    let (_, stats) = app.get_json("/get_stats").await;
    assert_eq!(stats["model"], "No model loaded");
}

#[tokio::test]
async fn test_get_stats_without_model() {
    let app = TestApp::new(&[]);

    let (status, stats) = app.get_json("/get_stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["model"], "No model loaded");
}

#[tokio::test]
async fn test_set_confidence_validation() {
    let app = TestApp::new(&[]);

    for bad in ["-0.1", "1.5", "abc", "NaN"] {
        let (status, body) = app.get_json(&format!("/set_confidence/{}", bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", bad);
        assert_eq!(body["status"], "error");
    }
    assert!((app.state.engine.confidence_threshold() - 0.5).abs() < 1e-6);

    let (status, body) = app.get_json("/set_confidence/0.42").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Confidence threshold set to 0.42");

    let (_, stats) = app.get_json("/get_stats").await;
    assert!((stats["confidence_threshold"].as_f64().unwrap() - 0.42).abs() < 1e-6);
}

#[tokio::test]
async fn test_export_detections_download() {
    let app = TestApp::new(&[]);
    let at = Utc::now();
    app.state
        .scan_state
        .publish(vec![Detection::new("cup", 0.8, BoundingBox::new(0, 0, 5, 5), at)], at);

    let (status, body, headers) = app.get("/export_detections").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment;filename=detections.json"
    );

    let export: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(export["total_objects"], 1);
    assert_eq!(export["objects"][0]["class"], "cup");
    assert_eq!(export["scan_duration"], 0.0);
    assert!(export["export_id"].is_string());
    assert!(export["export_time"].is_string());
}

#[tokio::test]
async fn test_capture_image_download() {
    let app = TestApp::new(&[]);
    app.state.feed.store_raw(&camera_frame());

    let (status, body, headers) = app.get("/capture_image").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(headers[header::CONTENT_DISPOSITION], "attachment;filename=capture.jpg");

    let image = image::load_from_memory(&body).unwrap();
    assert_eq!((image.width(), image.height()), (640, 480));
}

#[tokio::test]
async fn test_capture_image_without_frame_uses_camera_resolution() {
    let app = TestApp::new(&[]);
    let (status, body, _) = app.get("/capture_image").await;

    assert_eq!(status, StatusCode::OK);
    let image = image::load_from_memory(&body).unwrap();
    assert_eq!((image.width(), image.height()), (640, 480));
}

#[tokio::test]
async fn test_system_info() {
    let app = TestApp::new(&[]);
    let (status, info) = app.get_json("/system_info").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["system"]["name"], "AI Object Scanner System");
    assert_eq!(info["system"]["detection_models"]["yolov3"], "YOLOv3 (Balanced)");
    assert_eq!(info["system"]["object_categories"], 41);
    assert_eq!(info["hardware"]["camera_available"], false);
    assert_eq!(info["hardware"]["camera_resolution"], "640x480");
    assert_eq!(info["hardware"]["gpu_available"], false);
    assert_eq!(info["status"]["scanning"], false);
    assert_eq!(info["status"]["objects_in_memory"], 0);
}

#[tokio::test]
async fn test_index_page_embeds_feed() {
    let app = TestApp::new(&[]);
    let (status, body, _) = app.get("/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("/video_feed"));
}

#[tokio::test]
async fn test_video_feed_emits_multipart_parts() {
    let app = TestApp::new(&[]);
    app.state.feed.publish(vec![0xFF, 0xD8, 0xFF, 0xD9], Utc::now());

    let response = app
        .router()
        .oneshot(Request::builder().uri("/video_feed").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "multipart/x-mixed-replace; boundary=frame"
    );

    let mut body = response.into_body().into_data_stream();
    let first = body.next().await.unwrap().unwrap();
    assert!(first.starts_with(b"--frame\r\nContent-Type: image/jpeg\r\n"));
    assert!(first.ends_with(b"\xFF\xD8\xFF\xD9\r\n"));

    app.state.feed.publish(vec![0xFF, 0xD8, 0x00, 0xFF, 0xD9], Utc::now());
    let second = body.next().await.unwrap().unwrap();
    assert!(second.windows(18).any(|w| w == b"Content-Length: 5\r"));
}

#[tokio::test]
async fn test_cors_headers_present() {
    let app = TestApp::new(&[]);
    let response = app
        .router()
        .oneshot(
            Request::builder()
                .uri("/get_stats")
                .header(header::ORIGIN, "http://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
