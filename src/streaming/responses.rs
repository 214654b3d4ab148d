use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::camera::CameraState;
use crate::categories::category_for;
use crate::detection::Detection;
use crate::error::{DetectionError, ScannerError};

/// Detection as listed by `/get_detections`
#[derive(Debug, Serialize)]
pub struct EnrichedDetection<'a> {
    #[serde(flatten)]
    pub detection: &'a Detection,
    pub category: &'static str,
    pub scan_time: DateTime<Utc>,
}

impl<'a> EnrichedDetection<'a> {
    pub fn new(detection: &'a Detection, scan_time: DateTime<Utc>) -> Self {
        Self {
            detection,
            category: category_for(&detection.class_label),
            scan_time,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub status: &'static str,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct DetectionList<'a> {
    pub status: &'static str,
    pub count: usize,
    pub objects: Vec<EnrichedDetection<'a>>,
    pub scan_active: bool,
    pub last_scan: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct SingleScanResponse<'a> {
    pub status: &'static str,
    pub count: usize,
    pub objects: &'a [Detection],
    pub timestamp: DateTime<Utc>,
}

/// Reported as the stats model name when nothing is loaded
pub const NO_MODEL_LOADED: &str = "No model loaded";

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub objects_detected: usize,
    pub scan_active: bool,
    pub uptime: f64,
    pub fps: u32,
    pub camera_status: &'static str,
    pub model: String,
    pub confidence_threshold: f32,
}

#[derive(Debug, Serialize)]
pub struct ModelChanged {
    pub status: &'static str,
    pub message: String,
    pub model: String,
    pub requested: String,
    pub fallback_used: bool,
}

#[derive(Debug, Serialize)]
pub struct ThresholdChanged {
    pub status: &'static str,
    pub message: String,
    pub threshold: f32,
}

#[derive(Debug, Serialize)]
pub struct DetectionExport<'a> {
    pub export_id: uuid::Uuid,
    pub export_time: DateTime<Utc>,
    pub total_objects: usize,
    pub objects: &'a [Detection],
    pub scan_duration: f64,
}

#[derive(Debug, Serialize)]
pub struct SystemInfo {
    pub system: SystemDetails,
    pub hardware: HardwareDetails,
    pub status: RuntimeStatus,
}

#[derive(Debug, Serialize)]
pub struct SystemDetails {
    pub name: &'static str,
    pub version: &'static str,
    pub detection_models: BTreeMap<&'static str, &'static str>,
    pub active_model: Option<String>,
    pub object_categories: usize,
}

#[derive(Debug, Serialize)]
pub struct HardwareDetails {
    pub camera_available: bool,
    pub camera_resolution: String,
    pub gpu_available: bool,
    pub camera: CameraState,
}

#[derive(Debug, Serialize)]
pub struct RuntimeStatus {
    pub scanning: bool,
    pub objects_in_memory: usize,
    pub uptime_seconds: f64,
}

/// Error payload `{status: "error", message}` with a matching HTTP status
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<ScannerError> for ApiError {
    fn from(err: ScannerError) -> Self {
        let status = match &err {
            ScannerError::InvalidParameter { .. }
            | ScannerError::Detection(DetectionError::UnknownModel { .. }) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<DetectionError> for ApiError {
    fn from(err: DetectionError) -> Self {
        ScannerError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "status": "error",
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}
