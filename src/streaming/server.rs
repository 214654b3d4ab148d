use crate::{
    camera::CameraStatus,
    config::StreamConfig,
    detection::DetectionEngine,
    error::{Result, ScannerError, StreamError},
    pipeline::FrameFeed,
    state::DetectionStateStore,
};
use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;

use super::handlers::{
    capture_image_handler, change_model_handler, export_detections_handler, get_detections_handler,
    get_stats_handler, index_handler, scan_single_handler, set_confidence_handler, start_scan_handler,
    stop_scan_handler, system_info_handler, video_feed_handler,
};

/// Shared state for the Axum server
#[derive(Clone)]
pub struct ServerState {
    pub(crate) engine: Arc<DetectionEngine>,
    pub(crate) scan_state: DetectionStateStore,
    pub(crate) feed: Arc<FrameFeed>,
    pub(crate) camera: CameraStatus,
    pub(crate) started_at: Instant,
    pub(crate) jpeg_quality: u8,
}

impl ServerState {
    pub fn new(
        engine: Arc<DetectionEngine>,
        scan_state: DetectionStateStore,
        feed: Arc<FrameFeed>,
        camera: CameraStatus,
        jpeg_quality: u8,
    ) -> Self {
        Self {
            engine,
            scan_state,
            feed,
            camera,
            started_at: Instant::now(),
            jpeg_quality,
        }
    }
}

/// Route table for the scanner API
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/video_feed", get(video_feed_handler))
        .route("/start_scan", get(start_scan_handler))
        .route("/stop_scan", get(stop_scan_handler))
        .route("/get_detections", get(get_detections_handler))
        .route("/scan_single", get(scan_single_handler))
        .route("/get_stats", get(get_stats_handler))
        .route("/change_model/:name", get(change_model_handler))
        .route("/set_confidence/:threshold", get(set_confidence_handler))
        .route("/export_detections", get(export_detections_handler))
        .route("/capture_image", get(capture_image_handler))
        .route("/system_info", get(system_info_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// HTTP server exposing the video feed and detection API
pub struct StreamServer {
    pub(crate) config: StreamConfig,
    pub(crate) state: ServerState,
}

impl StreamServer {
    pub fn new(config: StreamConfig, state: ServerState) -> Self {
        Self { config, state }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.config.ip, self.config.port)
    }

    /// Bind the listening socket
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| StreamError::BindFailed {
                address: addr.clone(),
                source: e,
            })?;

        info!("Scanner server listening on http://{}", addr);
        Ok(listener)
    }

    /// Serve requests on `listener` until `shutdown` is cancelled
    pub async fn serve(self, listener: TcpListener, shutdown: CancellationToken) -> Result<()> {
        let app = router(self.state);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| StreamError::StartupFailed {
                details: format!("Server error: {}", e),
            })?;

        info!("Scanner HTTP server stopped");
        Ok(())
    }
}

/// Stream server builder for configuration
#[derive(Default)]
pub struct StreamServerBuilder {
    config: Option<StreamConfig>,
    engine: Option<Arc<DetectionEngine>>,
    scan_state: Option<DetectionStateStore>,
    feed: Option<Arc<FrameFeed>>,
    camera: Option<CameraStatus>,
}

impl StreamServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the stream configuration
    pub fn config(mut self, config: StreamConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn engine(mut self, engine: Arc<DetectionEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn scan_state(mut self, scan_state: DetectionStateStore) -> Self {
        self.scan_state = Some(scan_state);
        self
    }

    pub fn feed(mut self, feed: Arc<FrameFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    pub fn camera_status(mut self, camera: CameraStatus) -> Self {
        self.camera = Some(camera);
        self
    }

    /// Build the stream server
    pub fn build(self) -> Result<StreamServer> {
        let config = self.config.ok_or_else(|| missing("Stream configuration"))?;
        let engine = self.engine.ok_or_else(|| missing("Detection engine"))?;
        let scan_state = self.scan_state.ok_or_else(|| missing("Detection state store"))?;
        let feed = self.feed.ok_or_else(|| missing("Frame feed"))?;
        let camera = self.camera.ok_or_else(|| missing("Camera status"))?;

        let state = ServerState::new(engine, scan_state, feed, camera, config.jpeg_quality);
        Ok(StreamServer::new(config, state))
    }
}

fn missing(what: &str) -> ScannerError {
    ScannerError::Stream(StreamError::StartupFailed {
        details: format!("{} is required", what),
    })
}
