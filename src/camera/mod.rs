mod device;
mod fallback;
mod source;
mod status;

#[cfg(all(target_os = "linux", feature = "camera"))]
pub use device::GstCaptureDevice;
pub use device::{default_capture_device, CaptureDevice, UnavailableDevice};
pub use fallback::{fallback_marker_position, render_fallback_frame};
pub use source::{CameraSource, FpsCounter};
pub use status::{CameraState, CameraStatus};
