use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

use crate::detection::Detection;

#[derive(Debug, Default)]
struct ScanState {
    active: bool,
    detections: Arc<Vec<Detection>>,
    last_scan_time: Option<DateTime<Utc>>,
}

/// Consistent view of the scan state at one instant
#[derive(Debug, Clone)]
pub struct ScanSnapshot {
    pub active: bool,
    pub detections: Arc<Vec<Detection>>,
    pub last_scan_time: Option<DateTime<Utc>>,
}

impl ScanSnapshot {
    pub fn count(&self) -> usize {
        self.detections.len()
    }
}

/// The shared record of the latest detections and whether scanning is on.
///
/// Batches are replaced whole behind a short-held lock, so readers see
/// either the previous list or the new one. Cloning the store shares it.
#[derive(Debug, Clone, Default)]
pub struct DetectionStateStore {
    inner: Arc<Mutex<ScanState>>,
}

impl DetectionStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_snapshot(&self) -> ScanSnapshot {
        let state = self.inner.lock();
        ScanSnapshot {
            active: state.active,
            detections: Arc::clone(&state.detections),
            last_scan_time: state.last_scan_time,
        }
    }

    pub fn set_active(&self, active: bool) {
        let previous = std::mem::replace(&mut self.inner.lock().active, active);
        if previous != active {
            info!("Object scanning {}", if active { "started" } else { "stopped" });
        }
    }

    pub fn is_active(&self) -> bool {
        self.inner.lock().active
    }

    /// Replace the detection batch and stamp the scan time
    pub fn publish(&self, detections: Vec<Detection>, scanned_at: DateTime<Utc>) -> Arc<Vec<Detection>> {
        let batch = Arc::new(detections);
        {
            let mut state = self.inner.lock();
            state.detections = Arc::clone(&batch);
            state.last_scan_time = Some(scanned_at);
        }
        debug!("Published {} detections", batch.len());
        batch
    }
}
