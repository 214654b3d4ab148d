use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

use super::feed::FrameFeed;
use crate::detection::{Detection, DetectionEngine};
use crate::error::Result;
use crate::frame::Frame;
use crate::state::DetectionStateStore;

/// Result of a detection pass run outside the producer loop
#[derive(Debug, Clone)]
pub struct SingleScan {
    pub detections: Arc<Vec<Detection>>,
    pub scanned_at: DateTime<Utc>,
}

/// Detect on the producer's latest frame and publish the batch.
///
/// Returns `None` until the producer has delivered a frame.
pub fn scan_latest_frame(
    engine: &DetectionEngine,
    state: &DetectionStateStore,
    feed: &FrameFeed,
) -> Option<SingleScan> {
    let frame = feed.latest_frame()?;
    let detections = engine.detect_objects(&frame);
    let scanned_at = Utc::now();
    let detections = state.publish(detections, scanned_at);
    debug!("Single scan found {} objects", detections.len());

    Some(SingleScan {
        detections,
        scanned_at,
    })
}

/// Encode a still of the latest frame with overlay and capture annotation.
///
/// Uses a blank frame of `resolution` when no frame has been produced yet.
pub fn capture_still(
    engine: &DetectionEngine,
    state: &DetectionStateStore,
    feed: &FrameFeed,
    resolution: (u32, u32),
    jpeg_quality: u8,
) -> Result<Vec<u8>> {
    let snapshot = state.get_snapshot();
    let mut frame = feed
        .latest_frame()
        .unwrap_or_else(|| Frame::blank(resolution.0, resolution.1));

    let object_count = if snapshot.active {
        frame = engine.draw_detections(frame, &snapshot.detections);
        Some(snapshot.count())
    } else {
        None
    };

    let frame = engine.renderer().annotate_capture(frame, Utc::now(), object_count);
    frame.encode_jpeg(jpeg_quality)
}
