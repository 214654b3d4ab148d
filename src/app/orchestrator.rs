use super::types::{ComponentState, ShutdownReason};
use crate::camera::{CameraSource, CameraStatus, CaptureDevice};
use crate::config::ScannerConfig;
use crate::detection::{DetectionEngine, ModelLoader};
use crate::error::Result;
use crate::overlay::{OverlayRenderer, TextPainter};
use crate::pipeline::{FrameFeed, ProducerHandle};
use crate::state::DetectionStateStore;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Owns every scanner component and drives startup, run and shutdown
pub struct ScannerApp {
    pub(super) config: ScannerConfig,
    pub(super) engine: Arc<DetectionEngine>,
    pub(super) scan_state: DetectionStateStore,
    pub(super) feed: Arc<FrameFeed>,
    pub(super) camera_status: CameraStatus,

    // Moved into the producer thread on start
    pub(super) camera: Option<CameraSource>,
    pub(super) producer: Option<ProducerHandle>,
    pub(super) server_task: Option<JoinHandle<Result<()>>>,
    pub(super) server_addr: Option<SocketAddr>,

    // Lifecycle management
    pub(super) component_states: Arc<Mutex<HashMap<String, ComponentState>>>,
    pub(super) shutdown_sender: Option<oneshot::Sender<ShutdownReason>>,
    pub(super) shutdown_receiver: Option<oneshot::Receiver<ShutdownReason>>,
    pub(super) cancellation_token: CancellationToken,
}

impl ScannerApp {
    /// Assemble the components; nothing runs until [`ScannerApp::start`]
    pub fn new(
        config: ScannerConfig,
        loader: Arc<dyn ModelLoader>,
        device: Box<dyn CaptureDevice>,
    ) -> Result<Self> {
        config.validate()?;

        let painter = TextPainter::load(&config.overlay.font_path);
        let renderer = OverlayRenderer::from_config(&config.overlay, painter.clone());
        let engine = Arc::new(DetectionEngine::new(&config.detection, loader, renderer));
        let camera = CameraSource::new(&config.camera, device, painter);
        let camera_status = camera.status();
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();

        Ok(Self {
            config,
            engine,
            scan_state: DetectionStateStore::new(),
            feed: Arc::new(FrameFeed::new()),
            camera_status,
            camera: Some(camera),
            producer: None,
            server_task: None,
            server_addr: None,
            component_states: Arc::new(Mutex::new(HashMap::new())),
            shutdown_sender: Some(shutdown_sender),
            shutdown_receiver: Some(shutdown_receiver),
            cancellation_token: CancellationToken::new(),
        })
    }

    pub fn engine(&self) -> Arc<DetectionEngine> {
        Arc::clone(&self.engine)
    }

    pub fn scan_state(&self) -> DetectionStateStore {
        self.scan_state.clone()
    }

    pub fn feed(&self) -> Arc<FrameFeed> {
        Arc::clone(&self.feed)
    }

    pub fn camera_status(&self) -> CameraStatus {
        self.camera_status.clone()
    }

    /// Address the HTTP server bound to, once started
    pub fn server_addr(&self) -> Option<SocketAddr> {
        self.server_addr
    }

    /// Token that ends [`ScannerApp::run`] when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }
}
