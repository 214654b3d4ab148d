pub mod camera;
pub mod categories;
pub mod config;
pub mod detection;
pub mod error;
pub mod frame;
pub mod overlay;
pub mod pipeline;
pub mod state;

#[cfg(feature = "streaming")]
pub mod app;

#[cfg(feature = "streaming")]
pub mod streaming;

#[cfg(test)]
pub(crate) mod testing;

pub use camera::{CameraSource, CameraState, CameraStatus, CaptureDevice};
pub use config::ScannerConfig;
pub use detection::{BoundingBox, Detection, DetectionEngine, InferenceBackend, ModelDescriptor, ModelLoader};
pub use error::{Result, ScannerError};
pub use frame::Frame;
pub use overlay::OverlayRenderer;
pub use pipeline::{FrameFeed, StreamingPipeline};
pub use state::{DetectionStateStore, ScanSnapshot};

#[cfg(feature = "streaming")]
pub use app::{ComponentState, ScannerApp, ShutdownReason};

#[cfg(feature = "streaming")]
pub use streaming::{StreamServer, StreamServerBuilder};
