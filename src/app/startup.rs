use super::{ComponentState, ScannerApp};
use crate::error::{Result, ScannerError};
use crate::pipeline::StreamingPipeline;
use crate::streaming::StreamServerBuilder;
use tracing::{error, info, warn};

impl ScannerApp {
    /// Open the camera, load the startup model, then start the producer and HTTP server.
    ///
    /// A missing camera or model only degrades the service; a socket that
    /// cannot be bound is fatal.
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting object scanner");

        let mut camera = self
            .camera
            .take()
            .ok_or_else(|| ScannerError::system("Scanner already started"))?;

        self.set_component_state("camera", ComponentState::Starting)
            .await;
        if camera.initialize(self.config.camera.index) {
            self.set_component_state("camera", ComponentState::Running)
                .await;
        } else {
            warn!("Camera initialization failed. Using fallback mode.");
            self.set_component_state("camera", ComponentState::Degraded)
                .await;
        }

        self.set_component_state("detector", ComponentState::Starting)
            .await;
        let engine = self.engine();
        let model = self.config.detection.model.clone();
        let loaded = tokio::task::spawn_blocking(move || engine.load_model(&model))
            .await
            .unwrap_or(false);
        if loaded {
            self.set_component_state("detector", ComponentState::Running)
                .await;
        } else {
            warn!("No detection model loaded; scans will report no objects");
            self.set_component_state("detector", ComponentState::Degraded)
                .await;
        }

        let server = StreamServerBuilder::new()
            .config(self.config.stream.clone())
            .engine(self.engine())
            .scan_state(self.scan_state())
            .feed(self.feed())
            .camera_status(self.camera_status())
            .build()?;

        self.set_component_state("streaming", ComponentState::Starting)
            .await;
        let listener = server.bind().await.map_err(|e| {
            error!("Failed to start HTTP server: {}", e);
            e
        })?;
        self.server_addr = listener.local_addr().ok();

        let pipeline = StreamingPipeline::new(
            camera,
            self.engine(),
            self.scan_state(),
            self.feed(),
            &self.config.stream,
        );
        self.set_component_state("producer", ComponentState::Starting)
            .await;
        self.producer = Some(pipeline.spawn(self.cancellation_token.child_token())?);
        self.set_component_state("producer", ComponentState::Running)
            .await;

        let shutdown = self.cancellation_token.child_token();
        self.server_task = Some(tokio::spawn(async move {
            server.serve(listener, shutdown).await.map_err(|e| {
                error!("Stream server error: {}", e);
                e
            })
        }));
        self.set_component_state("streaming", ComponentState::Running)
            .await;

        info!(
            "Object scanner running on http://{}:{}",
            self.config.stream.ip, self.config.stream.port
        );
        Ok(())
    }
}
