use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClosetError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Processing error: {0}")]
    Processing(#[from] ProcessingError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Weather error: {0}")]
    Weather(#[from] WeatherError),

    #[error("Motion sensor error: {0}")]
    Motion(#[from] MotionError),

    #[error("Event bus error: {0}")]
    EventBus(#[from] EventBusError),

    #[error("Permission denied for {resource}")]
    PermissionDenied { resource: String },

    #[error("Pipeline busy ({state})")]
    Busy { state: String },

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl ClosetError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Short reason recorded in a failed pipeline state.
    ///
    /// Server failures report their bare status code, transport failures their
    /// message, everything else its display form.
    pub fn failure_reason(&self) -> String {
        match self {
            ClosetError::Storage(e) => e.failure_reason(),
            ClosetError::Camera(CameraError::Capture { details }) => details.clone(),
            other => other.to_string(),
        }
    }

    /// Text for the one transient notification shown for a terminal outcome.
    pub fn user_message(&self) -> String {
        match self {
            ClosetError::Storage(StorageError::Server { status, .. }) => {
                format!("Error: {}", status)
            }
            ClosetError::Storage(StorageError::Network { details }) => {
                format!("Network error: {}", details)
            }
            ClosetError::Camera(e) => format!("Camera error: {}", e),
            ClosetError::Processing(e) => format!("Could not prepare image: {}", e),
            ClosetError::PermissionDenied { resource } => {
                format!("Permission needed for {}", resource)
            }
            other => other.to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    /// The camera subsystem could not bind; cached for the rest of the session.
    #[error("Camera initialization failed: {details}")]
    Initialization { details: String },

    #[error("Camera is not bound")]
    NotBound,

    #[error("Camera unavailable: {reason}")]
    Unavailable { reason: String },

    /// A single shot failed after a successful bind.
    #[error("Capture failed: {details}")]
    Capture { details: String },

    #[error("Permission denied for camera {device}")]
    PermissionDenied { device: String },
}

impl CameraError {
    /// Per-shot failures leave the camera usable; everything else disables capture.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CameraError::Capture { .. })
    }
}

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Frame decode failed: {details}")]
    Decode { details: String },

    #[error("Image encoding failed: {details}")]
    Encoding { details: String },

    #[error("Processing task failed: {details}")]
    Task { details: String },
}

#[derive(Error, Debug, Clone)]
pub enum SegmentationError {
    #[error("Segmentation failed: {details}")]
    Failed { details: String },

    #[error("Segmentation timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("Network failure: {details}")]
    Network { details: String },

    #[error("Server responded with status {status}")]
    Server { status: u16, body: String },

    #[error("Response decode failed: {details}")]
    Decode { details: String },
}

impl StorageError {
    pub fn failure_reason(&self) -> String {
        match self {
            StorageError::Network { details } => details.clone(),
            StorageError::Server { status, .. } => status.to_string(),
            StorageError::Decode { details } => details.clone(),
        }
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            StorageError::Decode {
                details: e.to_string(),
            }
        } else {
            StorageError::Network {
                details: e.to_string(),
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Weather request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Weather service responded with status {status}")]
    Status { status: u16 },

    #[error("Location permission denied")]
    PermissionDenied,
}

#[derive(Error, Debug)]
pub enum MotionError {
    #[error("Accelerometer not present")]
    SensorAbsent,

    #[error("Accelerometer device error on {device}: {details}")]
    Device { device: String, details: String },
}

#[derive(Error, Debug)]
pub enum EventBusError {
    #[error("Event channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, ClosetError>;
