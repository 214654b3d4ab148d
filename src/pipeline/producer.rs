use chrono::Utc;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::feed::FrameFeed;
use crate::camera::CameraSource;
use crate::config::StreamConfig;
use crate::detection::DetectionEngine;
use crate::error::{Result, ScannerError};
use crate::state::DetectionStateStore;

/// Longest single sleep between cancellation checks
const CANCEL_POLL: Duration = Duration::from_millis(20);

/// What one loop iteration produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationReport {
    pub sequence: u64,
    pub scanned: bool,
    pub detections: usize,
}

/// The producer loop: capture, optionally detect and overlay, encode, publish.
///
/// Runs on its own thread and is the only writer of detection batches
/// during streaming. Faults inside an iteration are logged and followed by
/// a backoff pause; the loop only ends when cancelled.
pub struct StreamingPipeline {
    camera: CameraSource,
    engine: Arc<DetectionEngine>,
    state: DetectionStateStore,
    feed: Arc<FrameFeed>,
    frame_interval: Duration,
    error_backoff: Duration,
    jpeg_quality: u8,
}

impl StreamingPipeline {
    pub fn new(
        camera: CameraSource,
        engine: Arc<DetectionEngine>,
        state: DetectionStateStore,
        feed: Arc<FrameFeed>,
        config: &StreamConfig,
    ) -> Self {
        Self {
            camera,
            engine,
            state,
            feed,
            frame_interval: Duration::from_micros(1_000_000u64 / config.target_fps.max(1) as u64),
            error_backoff: Duration::from_millis(config.error_backoff_ms),
            jpeg_quality: config.jpeg_quality,
        }
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// Run one capture-to-publish pass
    pub fn run_iteration(&mut self) -> Result<IterationReport> {
        let frame = self.camera.get_frame();
        let captured_at = frame.captured_at;
        self.feed.store_raw(&frame);

        let (frame, scanned, detections) = if self.state.is_active() {
            let detections = self.engine.detect_objects(&frame);
            let batch = self.state.publish(detections, Utc::now());
            let count = batch.len();
            (self.engine.draw_detections(frame, &batch), true, count)
        } else {
            (frame, false, 0)
        };

        let jpeg = frame.encode_jpeg(self.jpeg_quality)?;
        let sequence = self.feed.publish(jpeg, captured_at);
        trace!("Published frame {} ({} detections)", sequence, detections);

        Ok(IterationReport {
            sequence,
            scanned,
            detections,
        })
    }

    /// Loop until `cancel` fires, then release the camera
    pub fn run(mut self, cancel: CancellationToken) {
        info!(
            "Frame producer started ({:?} per frame)",
            self.frame_interval
        );

        while !cancel.is_cancelled() {
            let started = Instant::now();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_iteration()));

            let pause = match outcome {
                Ok(Ok(_)) => self.frame_interval.saturating_sub(started.elapsed()),
                Ok(Err(e)) => {
                    error!("Frame generation error: {}", e);
                    self.error_backoff
                }
                Err(_) => {
                    error!("Frame producer iteration panicked");
                    self.error_backoff
                }
            };

            sleep_unless_cancelled(&cancel, pause);
        }

        self.camera.release();
        info!("Frame producer stopped");
    }

    /// Start the loop on a dedicated thread
    pub fn spawn(self, cancel: CancellationToken) -> Result<ProducerHandle> {
        let token = cancel.clone();
        let thread = thread::Builder::new()
            .name("frame-producer".to_string())
            .spawn(move || self.run(token))
            .map_err(|e| ScannerError::system(format!("Failed to spawn frame producer: {}", e)))?;

        Ok(ProducerHandle {
            cancel,
            thread: Some(thread),
        })
    }
}

fn sleep_unless_cancelled(cancel: &CancellationToken, total: Duration) {
    let deadline = Instant::now() + total;
    loop {
        let now = Instant::now();
        if cancel.is_cancelled() || now >= deadline {
            return;
        }
        thread::sleep((deadline - now).min(CANCEL_POLL));
    }
}

/// Owner of the running producer thread
#[derive(Debug)]
pub struct ProducerHandle {
    cancel: CancellationToken,
    thread: Option<JoinHandle<()>>,
}

impl ProducerHandle {
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancel the loop and wait for the thread to exit
    pub fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(thread) = self.thread.take() {
            debug!("Waiting for frame producer to exit");
            if thread.join().is_err() {
                warn!("Frame producer thread panicked during shutdown");
            }
        }
    }
}

impl Drop for ProducerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
