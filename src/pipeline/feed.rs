use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

use crate::frame::{EncodedFrame, Frame};

/// Latest output of the producer loop.
///
/// Stream clients follow the encoded frame through a watch channel, so each
/// client runs its own emit loop without repeating detection. The last raw
/// frame (before overlay) is kept for one-off scans and captures.
#[derive(Debug)]
pub struct FrameFeed {
    encoded: watch::Sender<Option<Arc<EncodedFrame>>>,
    raw: Mutex<Option<Frame>>,
    sequence: AtomicU64,
}

impl FrameFeed {
    pub fn new() -> Self {
        let (encoded, _) = watch::channel(None);
        Self {
            encoded,
            raw: Mutex::new(None),
            sequence: AtomicU64::new(0),
        }
    }

    /// Keep a copy of the camera frame for handlers
    pub fn store_raw(&self, frame: &Frame) {
        *self.raw.lock() = Some(frame.clone());
    }

    /// Publish an encoded frame to all stream clients; returns its sequence number
    pub fn publish(&self, jpeg: Vec<u8>, captured_at: DateTime<Utc>) -> u64 {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        self.encoded.send_replace(Some(Arc::new(EncodedFrame {
            sequence,
            captured_at,
            jpeg,
        })));
        sequence
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<EncodedFrame>>> {
        self.encoded.subscribe()
    }

    pub fn latest_encoded(&self) -> Option<Arc<EncodedFrame>> {
        self.encoded.borrow().clone()
    }

    /// Copy of the most recent camera frame, if the producer has run
    pub fn latest_frame(&self) -> Option<Frame> {
        self.raw.lock().clone()
    }

    pub fn frames_published(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

impl Default for FrameFeed {
    fn default() -> Self {
        Self::new()
    }
}
