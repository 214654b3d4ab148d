use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScannerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Detection error: {0}")]
    Detection(#[from] DetectionError),

    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("System error: {message}")]
    System { message: String },
}

/// Capture device failures. These never escape CameraSource; they select the fallback feed.
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open capture device {index}: {details}")]
    DeviceOpen { index: u32, details: String },

    #[error("Test read failed on capture device {index}")]
    TestReadFailed { index: u32 },

    #[error("Frame read failed: {details}")]
    ReadFailed { details: String },

    #[error("Capture pipeline error: {details}")]
    Pipeline { details: String },
}

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Unknown model '{name}'")]
    UnknownModel { name: String },

    #[error("Failed to load model '{name}': {details}")]
    ModelLoad { name: String, details: String },

    #[error("Inference failed: {details}")]
    Inference { details: String },

    #[error("Invalid frame: {details}")]
    InvalidFrame { details: String },
}

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Failed to bind {address}: {source}")]
    BindFailed {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server startup failed: {details}")]
    StartupFailed { details: String },
}

impl ScannerError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn invalid_parameter<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScannerError>;
