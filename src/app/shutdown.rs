use super::{ComponentState, ScannerApp};
use crate::error::Result;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info};

const STOP_TIMEOUT: Duration = Duration::from_secs(10);

impl ScannerApp {
    /// Stop the HTTP server, then the producer (which releases the camera)
    pub async fn shutdown(&mut self) -> Result<i32> {
        info!("Beginning graceful shutdown");

        self.cancellation_token.cancel();
        let mut exit_code = 0;

        if let Some(task) = self.server_task.take() {
            self.set_component_state("streaming", ComponentState::Stopping)
                .await;
            match timeout(STOP_TIMEOUT, task).await {
                Ok(Ok(Ok(()))) => {
                    self.set_component_state("streaming", ComponentState::Stopped)
                        .await;
                }
                Ok(Ok(Err(e))) => {
                    error!("Error stopping streaming: {}", e);
                    self.set_component_state("streaming", ComponentState::Failed)
                        .await;
                    exit_code = 1;
                }
                Ok(Err(e)) => {
                    error!("Streaming task failed: {}", e);
                    self.set_component_state("streaming", ComponentState::Failed)
                        .await;
                    exit_code = 1;
                }
                Err(_) => {
                    error!("streaming component stop timeout");
                    self.set_component_state("streaming", ComponentState::Failed)
                        .await;
                    exit_code = 1;
                }
            }
        }

        if let Some(mut producer) = self.producer.take() {
            self.set_component_state("producer", ComponentState::Stopping)
                .await;
            let stop = tokio::task::spawn_blocking(move || producer.stop());
            match timeout(STOP_TIMEOUT, stop).await {
                Ok(Ok(())) => {
                    self.set_component_state("producer", ComponentState::Stopped)
                        .await;
                    self.set_component_state("camera", ComponentState::Stopped)
                        .await;
                }
                Ok(Err(e)) => {
                    error!("Frame producer stop failed: {}", e);
                    self.set_component_state("producer", ComponentState::Failed)
                        .await;
                    exit_code = 1;
                }
                Err(_) => {
                    error!("producer component stop timeout");
                    self.set_component_state("producer", ComponentState::Failed)
                        .await;
                    exit_code = 1;
                }
            }
        }

        // Never started: the camera is still ours to release
        if let Some(mut camera) = self.camera.take() {
            camera.release();
        }

        info!("Graceful shutdown completed with exit code: {}", exit_code);
        Ok(exit_code)
    }
}
