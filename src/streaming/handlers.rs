use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use tracing::{debug, info, warn};

use super::responses::{
    ApiError, DetectionExport, DetectionList, EnrichedDetection, HardwareDetails, ModelChanged,
    RuntimeStatus, SingleScanResponse, StatsResponse, StatusMessage, SystemDetails, SystemInfo,
    ThresholdChanged, NO_MODEL_LOADED,
};
use super::server::ServerState;
use crate::categories::category_count;
use crate::detection::{find_model, validate_threshold, KNOWN_MODELS};
use crate::error::DetectionError;
use crate::pipeline::{capture_still, encode_part, mjpeg_content_type, scan_latest_frame};

/// Run blocking scanner work off the async workers
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::internal(format!("Worker task failed: {}", e)))
}

/// Handler for the MJPEG endpoint; each client follows the shared feed
pub async fn video_feed_handler(State(state): State<ServerState>) -> Response {
    info!("New MJPEG stream client connected");
    let mut frames = state.feed.subscribe();

    let stream = async_stream::stream! {
        let mut sent = 0u64;
        loop {
            let latest = frames.borrow_and_update().clone();
            if let Some(frame) = latest {
                sent += 1;
                yield Ok::<_, axum::Error>(Bytes::from(encode_part(&frame.jpeg)));
            }
            if frames.changed().await.is_err() {
                break;
            }
        }
        debug!("MJPEG client stream ended after {} frames", sent);
    };

    let content_type = mjpeg_content_type();
    (
        [
            (header::CONTENT_TYPE, content_type.as_str()),
            (header::CACHE_CONTROL, "no-cache, private"),
            (header::PRAGMA, "no-cache"),
        ],
        Body::from_stream(stream),
    )
        .into_response()
}

pub async fn start_scan_handler(State(state): State<ServerState>) -> Json<StatusMessage> {
    state.scan_state.set_active(true);
    Json(StatusMessage {
        status: "success",
        message: "AI Scanning Started".to_string(),
        timestamp: Utc::now(),
    })
}

pub async fn stop_scan_handler(State(state): State<ServerState>) -> Json<StatusMessage> {
    state.scan_state.set_active(false);
    Json(StatusMessage {
        status: "success",
        message: "AI Scanning Stopped".to_string(),
        timestamp: Utc::now(),
    })
}

pub async fn get_detections_handler(State(state): State<ServerState>) -> Response {
    let snapshot = state.scan_state.get_snapshot();
    let now = Utc::now();
    let objects: Vec<_> = snapshot
        .detections
        .iter()
        .map(|d| EnrichedDetection::new(d, now))
        .collect();

    Json(DetectionList {
        status: "success",
        count: objects.len(),
        objects,
        scan_active: snapshot.active,
        last_scan: snapshot.last_scan_time,
    })
    .into_response()
}

/// One detection pass on the latest frame, outside the producer loop
pub async fn scan_single_handler(State(state): State<ServerState>) -> Result<Response, ApiError> {
    let (engine, scan_state, feed) = (state.engine.clone(), state.scan_state.clone(), state.feed.clone());
    let scan = blocking(move || scan_latest_frame(&engine, &scan_state, &feed))
        .await?
        .ok_or_else(|| ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "No camera frame available"))?;

    Ok(Json(SingleScanResponse {
        status: "success",
        count: scan.detections.len(),
        objects: &scan.detections,
        timestamp: scan.scanned_at,
    })
    .into_response())
}

pub async fn get_stats_handler(State(state): State<ServerState>) -> Json<StatsResponse> {
    let snapshot = state.scan_state.get_snapshot();
    let camera = state.camera.snapshot();

    Json(StatsResponse {
        objects_detected: snapshot.count(),
        scan_active: snapshot.active,
        uptime: state.started_at.elapsed().as_secs_f64(),
        fps: camera.measured_fps,
        camera_status: if camera.connected { "connected" } else { "disconnected" },
        model: state
            .engine
            .current_model_name()
            .unwrap_or_else(|| NO_MODEL_LOADED.to_string()),
        confidence_threshold: state.engine.confidence_threshold(),
    })
}

pub async fn change_model_handler(
    State(state): State<ServerState>,
    Path(name): Path<String>,
) -> Result<Json<ModelChanged>, ApiError> {
    if find_model(&name).is_none() {
        warn!("Rejected change to unknown model '{}'", name);
        return Err(DetectionError::UnknownModel { name }.into());
    }

    let engine = state.engine.clone();
    let requested = name.clone();
    let loaded = blocking(move || engine.try_load_model(&requested)).await??;

    Ok(Json(ModelChanged {
        status: "success",
        message: format!("Model changed to {}", loaded.display_name),
        fallback_used: loaded.name != name,
        model: loaded.name,
        requested: name,
    }))
}

pub async fn set_confidence_handler(
    State(state): State<ServerState>,
    Path(raw): Path<String>,
) -> Result<Json<ThresholdChanged>, ApiError> {
    let threshold = validate_threshold("threshold", &raw)?;
    state.engine.set_confidence_threshold(threshold);

    Ok(Json(ThresholdChanged {
        status: "success",
        message: format!("Confidence threshold set to {:.2}", threshold),
        threshold,
    }))
}

/// Current batch as a downloadable JSON document
pub async fn export_detections_handler(State(state): State<ServerState>) -> Result<Response, ApiError> {
    let snapshot = state.scan_state.get_snapshot();
    let now = Utc::now();
    let scan_duration = match snapshot.last_scan_time {
        Some(at) if snapshot.active => (now - at).num_milliseconds().max(0) as f64 / 1000.0,
        _ => 0.0,
    };

    let export = DetectionExport {
        export_id: uuid::Uuid::new_v4(),
        export_time: now,
        total_objects: snapshot.count(),
        objects: &snapshot.detections,
        scan_duration,
    };
    let body = serde_json::to_string_pretty(&export)
        .map_err(|e| ApiError::internal(format!("Failed to serialize export: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CONTENT_DISPOSITION, "attachment;filename=detections.json"),
        ],
        body,
    )
        .into_response())
}

/// Still frame with overlay and capture annotation as a JPEG download
pub async fn capture_image_handler(State(state): State<ServerState>) -> Result<Response, ApiError> {
    let (engine, scan_state, feed) = (state.engine.clone(), state.scan_state.clone(), state.feed.clone());
    let resolution = state.camera.snapshot().resolution;
    let quality = state.jpeg_quality;

    let jpeg = blocking(move || capture_still(&engine, &scan_state, &feed, resolution, quality))
        .await?
        .map_err(|e| ApiError::internal(format!("Failed to capture image: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/jpeg"),
            (header::CONTENT_DISPOSITION, "attachment;filename=capture.jpg"),
        ],
        jpeg,
    )
        .into_response())
}

pub async fn system_info_handler(State(state): State<ServerState>) -> Json<SystemInfo> {
    let snapshot = state.scan_state.get_snapshot();
    let camera = state.camera.snapshot();

    Json(SystemInfo {
        system: SystemDetails {
            name: "AI Object Scanner System",
            version: env!("CARGO_PKG_VERSION"),
            detection_models: KNOWN_MODELS
                .iter()
                .map(|m| (m.name, m.display_name))
                .collect(),
            active_model: state.engine.current_model_name(),
            object_categories: category_count(),
        },
        hardware: HardwareDetails {
            camera_available: camera.connected,
            camera_resolution: state.camera.resolution_string(),
            gpu_available: state.engine.gpu_available(),
            camera,
        },
        status: RuntimeStatus {
            scanning: snapshot.active,
            objects_in_memory: snapshot.count(),
            uptime_seconds: state.started_at.elapsed().as_secs_f64(),
        },
    })
}

/// Minimal viewer page with scan controls
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Object Scanner</title>
    <style>
        :root { color-scheme: dark; }
        body { margin: 0; background: #000; color: #0f0; font-family: monospace; }
        main { display: flex; flex-direction: column; align-items: center; gap: 12px; padding: 12px; }
        img.stream { display: block; max-width: 100vw; max-height: 80vh; object-fit: contain; }
        button { background: #111; color: #0f0; border: 1px solid #0f0; padding: 6px 14px; }
        pre { max-width: 90vw; overflow: auto; }
    </style>
</head>
<body>
<main>
    <img class="stream" src="/video_feed" alt="Scanner stream">
    <div>
        <button onclick="call('/start_scan')">Start scan</button>
        <button onclick="call('/stop_scan')">Stop scan</button>
        <button onclick="call('/scan_single')">Single scan</button>
        <a href="/capture_image"><button>Capture</button></a>
        <a href="/export_detections"><button>Export</button></a>
    </div>
    <div id="stats"></div>
    <pre id="out"></pre>
</main>
<script>
    async function call(path) {
        const res = await fetch(path);
        document.getElementById('out').textContent = JSON.stringify(await res.json(), null, 2);
    }
    setInterval(async () => {
        const res = await fetch('/get_stats');
        if (res.ok) {
            const s = await res.json();
            document.getElementById('stats').textContent =
                `objects: ${s.objects_detected} | scanning: ${s.scan_active} | fps: ${s.fps} | model: ${s.model}`;
        }
    }, 1000);
</script>
</body>
</html>
"#;
