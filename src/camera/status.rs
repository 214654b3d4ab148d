use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

/// Observable camera condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CameraState {
    pub connected: bool,
    /// Frames read in the last full second
    pub measured_fps: u32,
    pub resolution: (u32, u32),
}

/// Shared read handle on the camera state; only `CameraSource` writes it
#[derive(Debug, Clone)]
pub struct CameraStatus {
    inner: Arc<RwLock<CameraState>>,
}

impl CameraStatus {
    pub fn new(resolution: (u32, u32)) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CameraState {
                connected: false,
                measured_fps: 0,
                resolution,
            })),
        }
    }

    pub fn snapshot(&self) -> CameraState {
        *self.inner.read()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.read().connected
    }

    pub fn resolution_string(&self) -> String {
        let (w, h) = self.inner.read().resolution;
        format!("{}x{}", w, h)
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.inner.write().connected = connected;
    }

    pub(crate) fn set_fps(&self, fps: u32) {
        self.inner.write().measured_fps = fps;
    }

    pub(crate) fn set_resolution(&self, resolution: (u32, u32)) {
        self.inner.write().resolution = resolution;
    }
}
