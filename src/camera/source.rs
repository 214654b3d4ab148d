use chrono::Utc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::device::CaptureDevice;
use super::fallback::render_fallback_frame;
use super::status::CameraStatus;
use crate::config::CameraConfig;
use crate::error::CameraError;
use crate::frame::Frame;
use crate::overlay::TextPainter;

/// Counts frames and publishes the count once per elapsed second
#[derive(Debug)]
pub struct FpsCounter {
    frames: u32,
    fps: u32,
    last_update: Instant,
}

impl FpsCounter {
    pub fn new(now: Instant) -> Self {
        Self {
            frames: 0,
            fps: 0,
            last_update: now,
        }
    }

    /// Record one frame; returns the new rate when a measurement closes
    pub fn tick(&mut self, now: Instant) -> Option<u32> {
        self.frames += 1;
        if now.duration_since(self.last_update) >= Duration::from_secs(1) {
            self.fps = self.frames;
            self.frames = 0;
            self.last_update = now;
            Some(self.fps)
        } else {
            None
        }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }
}

/// Owns the capture device and always hands back a frame.
///
/// Device failures only flip the connected flag; callers get the
/// simulated feed instead of an error.
pub struct CameraSource {
    device: Box<dyn CaptureDevice>,
    resolution: (u32, u32),
    target_fps: u32,
    opened: bool,
    connected: bool,
    fps: FpsCounter,
    painter: TextPainter,
    status: CameraStatus,
}

impl CameraSource {
    pub fn new(config: &CameraConfig, device: Box<dyn CaptureDevice>, painter: TextPainter) -> Self {
        Self {
            device,
            resolution: config.resolution,
            target_fps: config.fps,
            opened: false,
            connected: false,
            fps: FpsCounter::new(Instant::now()),
            painter,
            status: CameraStatus::new(config.resolution),
        }
    }

    /// Open the device and perform one test read
    pub fn initialize(&mut self, index: u32) -> bool {
        match self.try_initialize(index) {
            Ok(()) => true,
            Err(e) => {
                warn!("Camera initialization error: {}", e);
                false
            }
        }
    }

    /// Like [`initialize`](Self::initialize), surfacing why the device is unusable
    pub fn try_initialize(&mut self, index: u32) -> Result<(), CameraError> {
        if self.opened {
            self.release();
        }

        self.device.open(index, self.resolution, self.target_fps)?;
        self.opened = true;

        match self.device.read_frame() {
            Ok(frame) => {
                self.connected = true;
                self.status.set_connected(true);
                self.status.set_resolution(frame.resolution());
                info!(
                    "Camera {} initialized: {}x{}",
                    index,
                    frame.width(),
                    frame.height()
                );
                Ok(())
            }
            Err(e) => {
                debug!("Test read on device {} returned: {}", index, e);
                self.release();
                Err(CameraError::TestReadFailed { index })
            }
        }
    }

    /// Next camera frame, or the simulated frame when disconnected
    pub fn get_frame(&mut self) -> Frame {
        if !self.connected {
            return self.fallback_frame();
        }

        match self.device.read_frame() {
            Ok(frame) => {
                if let Some(fps) = self.fps.tick(Instant::now()) {
                    self.status.set_fps(fps);
                }
                frame
            }
            Err(e) => {
                warn!("Camera read failed, switching to simulated feed: {}", e);
                self.connected = false;
                self.status.set_connected(false);
                self.status.set_fps(0);
                self.fallback_frame()
            }
        }
    }

    fn fallback_frame(&self) -> Frame {
        let t = Utc::now().timestamp_millis() as f64 / 1000.0;
        render_fallback_frame(self.resolution.0, self.resolution.1, t, &self.painter)
    }

    pub fn get_fps(&self) -> u32 {
        self.fps.fps()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    /// Shared status handle for readers outside the producer thread
    pub fn status(&self) -> CameraStatus {
        self.status.clone()
    }

    /// Close the device. Safe to call any number of times.
    pub fn release(&mut self) {
        if !self.opened {
            return;
        }
        self.device.close();
        self.opened = false;
        self.connected = false;
        self.status.set_connected(false);
        debug!("Camera released");
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        self.release();
    }
}
