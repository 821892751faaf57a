pub mod app;
pub mod auth;
pub mod camera;
pub mod canvas;
pub mod config;
pub mod error;
pub mod events;
pub mod frame;
pub mod motion;
pub mod preprocess;
pub mod storage;
pub mod upload;
pub mod weather;

#[cfg(test)]
mod test_support;

pub use app::{ClosetOrchestrator, Component, ComponentState, ShutdownReason};
pub use auth::{SessionProvider, StaticSession};
pub use camera::{FrameCapture, FrameCaptureBuilder, FrameSource, PlaceholderSource, StillImageSource};
pub use canvas::{Offset, OutfitCanvas, OutfitEditor, Slot};
pub use config::SmartClosetConfig;
pub use error::{ClosetError, Result};
pub use events::{ClosetEvent, EventBus, EventFilter, EventReceiver, NotificationLevel};
pub use frame::{Frame, FrameFormat, Rotation};
pub use motion::{AccelerationSample, AccelerometerSource, MotionEventFilter, ShakeDetector, ShakeEvent};
pub use preprocess::{EncodedImage, ImagePreprocessor, ProcessedImage, SegmentationOutcome, Segmenter};
pub use storage::{Garment, HttpStorageClient, StorageService, UploadRequest, UploadResponse, Wardrobe};
pub use upload::{CaptureRequest, PipelineState, UploadCoordinator};
pub use weather::{WeatherClient, WeatherCondition, WeatherReport};
