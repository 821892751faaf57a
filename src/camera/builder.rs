use super::interface::{FrameCapture, FrameSource};
use super::sources::{PlaceholderSource, StillImageSource};
use crate::config::{CameraConfig, FrameSourceKind};
use crate::error::{ClosetError, Result};
use crate::events::EventBus;
use crate::frame::Rotation;
use std::sync::Arc;

/// Builder for a frame capture backed by the configured source
pub struct FrameCaptureBuilder {
    config: Option<CameraConfig>,
    source: Option<Box<dyn FrameSource>>,
    event_bus: Option<Arc<EventBus>>,
}

impl FrameCaptureBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            source: None,
            event_bus: None,
        }
    }

    pub fn config(mut self, config: CameraConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use an explicit source instead of the configured one
    pub fn source(mut self, source: Box<dyn FrameSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn build(self) -> Result<FrameCapture> {
        let source = match (self.source, self.config) {
            (Some(source), _) => source,
            (None, Some(config)) => source_from_config(&config)?,
            (None, None) => {
                return Err(ClosetError::system(
                    "Camera configuration or frame source must be specified",
                ))
            }
        };

        let capture = FrameCapture::new(source);
        Ok(match self.event_bus {
            Some(bus) => capture.with_event_bus(bus),
            None => capture,
        })
    }
}

impl Default for FrameCaptureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn source_from_config(config: &CameraConfig) -> Result<Box<dyn FrameSource>> {
    let rotation = Rotation::from_degrees(config.rotation).ok_or_else(|| {
        ClosetError::system(format!("Invalid camera rotation {}", config.rotation))
    })?;

    Ok(match config.source {
        FrameSourceKind::Still => Box::new(StillImageSource::new(&config.image_path, rotation)),
        FrameSourceKind::Placeholder => Box::new(PlaceholderSource::new()),
    })
}
