use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScannerConfig {
    pub camera: CameraConfig,
    pub detection: DetectionConfig,
    pub overlay: OverlayConfig,
    pub stream: StreamConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    /// Capture device index (e.g., 0 for /dev/video0)
    #[serde(default = "default_camera_index")]
    pub index: u32,

    /// Requested resolution (width, height); also the fallback frame size
    #[serde(default = "default_camera_resolution")]
    pub resolution: (u32, u32),

    /// Requested capture frame rate
    #[serde(default = "default_camera_fps")]
    pub fps: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DetectionConfig {
    /// Model loaded at startup
    #[serde(default = "default_model")]
    pub model: String,

    /// Lightweight model tried once when a requested model fails to load
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,

    /// Directory holding model config/weight files
    #[serde(default = "default_model_dir")]
    pub model_dir: String,

    /// Minimum class score for a candidate to be kept
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// IoU cutoff for non-maximum suppression
    #[serde(default = "default_nms_threshold")]
    pub nms_threshold: f32,

    /// Request GPU execution when the backend supports it
    #[serde(default = "default_prefer_gpu")]
    pub prefer_gpu: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OverlayConfig {
    /// TrueType font used for labels and annotations
    #[serde(default = "default_font_path")]
    pub font_path: String,

    /// Label font size in pixels
    #[serde(default = "default_font_size")]
    pub font_size: f32,

    /// Timezone for burned-in capture timestamps
    #[serde(default = "default_timestamp_timezone")]
    pub timestamp_timezone: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StreamConfig {
    /// IP address to bind to
    #[serde(default = "default_stream_ip")]
    pub ip: String,

    /// Port to listen on
    #[serde(default = "default_stream_port")]
    pub port: u16,

    /// Upper bound on producer loop iterations per second
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,

    /// JPEG quality for streamed and captured frames (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Pause after a producer loop fault before retrying
    #[serde(default = "default_error_backoff_ms")]
    pub error_backoff_ms: u64,
}

impl ScannerConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("camera.index", default_camera_index())?
            .set_default(
                "camera.resolution",
                vec![default_camera_resolution().0, default_camera_resolution().1],
            )?
            .set_default("camera.fps", default_camera_fps())?
            .set_default("detection.model", default_model())?
            .set_default("detection.fallback_model", default_fallback_model())?
            .set_default("detection.model_dir", default_model_dir())?
            .set_default(
                "detection.confidence_threshold",
                default_confidence_threshold() as f64,
            )?
            .set_default("detection.nms_threshold", default_nms_threshold() as f64)?
            .set_default("detection.prefer_gpu", default_prefer_gpu())?
            .set_default("overlay.font_path", default_font_path())?
            .set_default("overlay.font_size", default_font_size() as f64)?
            .set_default("overlay.timestamp_timezone", default_timestamp_timezone())?
            .set_default("stream.ip", default_stream_ip())?
            .set_default("stream.port", default_stream_port())?
            .set_default("stream.target_fps", default_target_fps())?
            .set_default("stream.jpeg_quality", default_jpeg_quality() as i64)?
            .set_default("stream.error_backoff_ms", default_error_backoff_ms() as i64)?
            .add_source(File::with_name(&path_str).required(false))
            // e.g. SCANNER__STREAM__PORT=9090
            .add_source(Environment::with_prefix("SCANNER").separator("__"))
            .build()?;

        let config: ScannerConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.resolution.0 == 0 || self.camera.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Camera resolution must be greater than 0".to_string(),
            ));
        }

        if self.camera.fps == 0 {
            return Err(ConfigError::Message(
                "Camera fps must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.detection.confidence_threshold) {
            return Err(ConfigError::Message(
                "Detection confidence_threshold must be between 0 and 1".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.detection.nms_threshold) {
            return Err(ConfigError::Message(
                "Detection nms_threshold must be between 0 and 1".to_string(),
            ));
        }

        if self.stream.target_fps == 0 {
            return Err(ConfigError::Message(
                "Stream target_fps must be greater than 0".to_string(),
            ));
        }

        if self.stream.jpeg_quality == 0 || self.stream.jpeg_quality > 100 {
            return Err(ConfigError::Message(
                "Stream jpeg_quality must be between 1 and 100".to_string(),
            ));
        }

        if self.overlay.font_size <= 0.0 {
            return Err(ConfigError::Message(
                "Overlay font_size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                index: default_camera_index(),
                resolution: default_camera_resolution(),
                fps: default_camera_fps(),
            },
            detection: DetectionConfig {
                model: default_model(),
                fallback_model: default_fallback_model(),
                model_dir: default_model_dir(),
                confidence_threshold: default_confidence_threshold(),
                nms_threshold: default_nms_threshold(),
                prefer_gpu: default_prefer_gpu(),
            },
            overlay: OverlayConfig {
                font_path: default_font_path(),
                font_size: default_font_size(),
                timestamp_timezone: default_timestamp_timezone(),
            },
            stream: StreamConfig {
                ip: default_stream_ip(),
                port: default_stream_port(),
                target_fps: default_target_fps(),
                jpeg_quality: default_jpeg_quality(),
                error_backoff_ms: default_error_backoff_ms(),
            },
        }
    }
}

/// Documented default configuration in TOML form
pub const DEFAULT_CONFIG_TOML: &str = r#"[camera]
# Capture device index (e.g., 0 for /dev/video0)
index = 0
# Requested resolution (width, height); also used for the fallback feed
resolution = [640, 480]
# Requested capture frame rate
fps = 30

[detection]
# Model loaded at startup: yolov3, yolov3-tiny, yolov4, yolov4-tiny, ssd_mobilenet
model = "yolov3"
# Model tried once if the requested model fails to load
fallback_model = "ssd_mobilenet"
# Directory holding model config and weight files
model_dir = "./models"
# Minimum class score for a detection (0-1)
confidence_threshold = 0.5
# IoU cutoff for non-maximum suppression (0-1)
nms_threshold = 0.4
# Request GPU execution when available
prefer_gpu = true

[overlay]
# TrueType font for labels; text is skipped if it cannot be read
font_path = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"
font_size = 16.0
# Timezone for capture timestamps
timestamp_timezone = "UTC"

[stream]
# IP address to bind to
ip = "0.0.0.0"
# Port to listen on
port = 5000
# Upper bound on frames produced per second
target_fps = 30
# JPEG quality (1-100)
jpeg_quality = 85
# Pause after a producer loop fault, in milliseconds
error_backoff_ms = 1000
"#;

// Default value functions
fn default_camera_index() -> u32 {
    0
}
fn default_camera_resolution() -> (u32, u32) {
    (640, 480)
}
fn default_camera_fps() -> u32 {
    30
}

fn default_model() -> String {
    "yolov3".to_string()
}
fn default_fallback_model() -> String {
    "ssd_mobilenet".to_string()
}
fn default_model_dir() -> String {
    "./models".to_string()
}
fn default_confidence_threshold() -> f32 {
    0.5
}
fn default_nms_threshold() -> f32 {
    0.4
}
fn default_prefer_gpu() -> bool {
    true
}

fn default_font_path() -> String {
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf".to_string()
}
fn default_font_size() -> f32 {
    16.0
}
fn default_timestamp_timezone() -> String {
    "UTC".to_string()
}

fn default_stream_ip() -> String {
    "0.0.0.0".to_string()
}
fn default_stream_port() -> u16 {
    5000
}
fn default_target_fps() -> u32 {
    30
}
fn default_jpeg_quality() -> u8 {
    85
}
fn default_error_backoff_ms() -> u64 {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ScannerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.detection.model, "yolov3");
        assert_eq!(config.stream.port, 5000);
    }

    #[test]
    fn test_default_toml_matches_defaults() {
        let parsed: ScannerConfig = toml::from_str(DEFAULT_CONFIG_TOML).unwrap();
        let defaults = ScannerConfig::default();

        assert_eq!(parsed.camera.resolution, defaults.camera.resolution);
        assert_eq!(parsed.detection.model, defaults.detection.model);
        assert_eq!(
            parsed.detection.confidence_threshold,
            defaults.detection.confidence_threshold
        );
        assert_eq!(parsed.stream.port, defaults.stream.port);
        assert_eq!(parsed.stream.jpeg_quality, defaults.stream.jpeg_quality);
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[stream]\nport = 8081\n\n[detection]\nmodel = \"yolov4-tiny\"").unwrap();

        let config = ScannerConfig::load_from_file(file.path()).unwrap();

        assert_eq!(config.stream.port, 8081);
        assert_eq!(config.detection.model, "yolov4-tiny");
        // Untouched sections keep their defaults
        assert_eq!(config.camera.resolution, (640, 480));
        assert_eq!(config.detection.nms_threshold, 0.4);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = ScannerConfig::load_from_file("does-not-exist.toml").unwrap();
        assert_eq!(config.camera.fps, 30);
        assert_eq!(config.stream.target_fps, 30);
    }

    #[test]
    fn test_config_validation() {
        let mut config = ScannerConfig::default();

        config.camera.resolution = (0, 0);
        assert!(config.validate().is_err());
        config.camera.resolution = (640, 480);
        assert!(config.validate().is_ok());

        config.detection.confidence_threshold = 1.5;
        assert!(config.validate().is_err());
        config.detection.confidence_threshold = 0.42;
        assert!(config.validate().is_ok());

        config.stream.jpeg_quality = 0;
        assert!(config.validate().is_err());
    }
}
