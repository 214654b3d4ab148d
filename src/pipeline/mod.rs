mod feed;
mod multipart;
mod oneshot;
mod producer;

pub use feed::FrameFeed;
pub use multipart::{encode_part, mjpeg_content_type, MJPEG_BOUNDARY};
pub use oneshot::{capture_still, scan_latest_frame, SingleScan};
pub use producer::{IterationReport, ProducerHandle, StreamingPipeline};
