use crate::error::CameraError;
use crate::frame::Frame;
use tracing::warn;

#[cfg(all(target_os = "linux", feature = "camera"))]
use gstreamer::prelude::*;

/// Exclusive handle on a video capture device.
///
/// Only `CameraSource` drives a device; reads are blocking.
pub trait CaptureDevice: Send {
    /// Open device `index` requesting the given resolution and frame rate
    fn open(&mut self, index: u32, resolution: (u32, u32), fps: u32) -> Result<(), CameraError>;

    /// Read one RGB frame
    fn read_frame(&mut self) -> Result<Frame, CameraError>;

    /// Release the device. Must tolerate repeated calls.
    fn close(&mut self);
}

/// Device used when the build has no capture support
#[derive(Debug, Default)]
pub struct UnavailableDevice;

impl CaptureDevice for UnavailableDevice {
    fn open(&mut self, index: u32, _resolution: (u32, u32), _fps: u32) -> Result<(), CameraError> {
        Err(CameraError::DeviceOpen {
            index,
            details: "camera support not compiled in (enable the 'camera' feature)".to_string(),
        })
    }

    fn read_frame(&mut self) -> Result<Frame, CameraError> {
        Err(CameraError::ReadFailed {
            details: "no capture device".to_string(),
        })
    }

    fn close(&mut self) {}
}

/// The capture device for this build
pub fn default_capture_device() -> Box<dyn CaptureDevice> {
    #[cfg(all(target_os = "linux", feature = "camera"))]
    {
        Box::new(GstCaptureDevice::default())
    }

    #[cfg(not(all(target_os = "linux", feature = "camera")))]
    {
        warn!("Built without camera support; serving the simulated feed");
        Box::new(UnavailableDevice)
    }
}

/// V4L2 capture through a GStreamer appsink delivering raw RGB frames
#[cfg(all(target_os = "linux", feature = "camera"))]
#[derive(Default)]
pub struct GstCaptureDevice {
    pipeline: Option<gstreamer::Pipeline>,
    appsink: Option<gstreamer_app::AppSink>,
}

#[cfg(all(target_os = "linux", feature = "camera"))]
impl GstCaptureDevice {
    const PULL_TIMEOUT_MS: u64 = 1000;

    fn pipeline_description(index: u32, resolution: (u32, u32), fps: u32) -> String {
        format!(
            "v4l2src device=/dev/video{} ! videoconvert ! videoscale ! \
             video/x-raw,format=RGB,width={},height={},framerate={}/1 ! \
             appsink name=sink sync=false max-buffers=2 drop=true",
            index, resolution.0, resolution.1, fps
        )
    }

    fn sample_to_frame(sample: &gstreamer::Sample) -> Result<Frame, CameraError> {
        let buffer = sample.buffer().ok_or_else(|| CameraError::ReadFailed {
            details: "No buffer in sample".to_string(),
        })?;
        let caps = sample.caps().ok_or_else(|| CameraError::ReadFailed {
            details: "No caps in sample".to_string(),
        })?;
        let info = gstreamer_video::VideoInfo::from_caps(caps).map_err(|e| CameraError::ReadFailed {
            details: format!("Failed to get video info: {}", e),
        })?;
        let map = buffer.map_readable().map_err(|e| CameraError::ReadFailed {
            details: format!("Failed to map buffer: {}", e),
        })?;

        let (width, height) = (info.width(), info.height());
        let row_bytes = width as usize * 3;
        let stride = info.stride().first().copied().unwrap_or(row_bytes as i32) as usize;
        let data = map.as_slice();

        let mut pixels = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = row * stride;
            let line = data.get(start..start + row_bytes).ok_or_else(|| CameraError::ReadFailed {
                details: format!("Short buffer: {} bytes for {}x{}", data.len(), width, height),
            })?;
            pixels.extend_from_slice(line);
        }

        let image = image::RgbImage::from_raw(width, height, pixels).ok_or_else(|| CameraError::ReadFailed {
            details: "Frame buffer size mismatch".to_string(),
        })?;
        Ok(Frame::new(image))
    }
}

#[cfg(all(target_os = "linux", feature = "camera"))]
impl CaptureDevice for GstCaptureDevice {
    fn open(&mut self, index: u32, resolution: (u32, u32), fps: u32) -> Result<(), CameraError> {
        gstreamer::init().map_err(|e| CameraError::DeviceOpen {
            index,
            details: format!("Failed to initialize GStreamer: {}", e),
        })?;

        let description = Self::pipeline_description(index, resolution, fps);
        tracing::info!("Creating GStreamer pipeline: {}", description);

        let pipeline = gstreamer::parse::launch(&description)
            .map_err(|e| CameraError::Pipeline {
                details: format!("Failed to create pipeline: {}", e),
            })?
            .downcast::<gstreamer::Pipeline>()
            .map_err(|_| CameraError::Pipeline {
                details: "Failed to downcast to Pipeline".to_string(),
            })?;

        let appsink = pipeline
            .by_name("sink")
            .and_then(|sink| sink.downcast::<gstreamer_app::AppSink>().ok())
            .ok_or_else(|| CameraError::Pipeline {
                details: "Pipeline has no appsink".to_string(),
            })?;

        pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| CameraError::DeviceOpen {
                index,
                details: format!("Failed to start pipeline: {}", e),
            })?;

        self.pipeline = Some(pipeline);
        self.appsink = Some(appsink);
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame, CameraError> {
        let appsink = self.appsink.as_ref().ok_or_else(|| CameraError::ReadFailed {
            details: "Device not open".to_string(),
        })?;

        let sample = appsink
            .try_pull_sample(gstreamer::ClockTime::from_mseconds(Self::PULL_TIMEOUT_MS))
            .ok_or_else(|| CameraError::ReadFailed {
                details: "No sample within timeout".to_string(),
            })?;

        Self::sample_to_frame(&sample)
    }

    fn close(&mut self) {
        self.appsink = None;
        if let Some(pipeline) = self.pipeline.take() {
            if let Err(e) = pipeline.set_state(gstreamer::State::Null) {
                warn!("Failed to stop GStreamer pipeline: {}", e);
            }
        }
    }
}
