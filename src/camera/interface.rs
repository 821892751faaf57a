use crate::error::CameraError;
use crate::events::{ClosetEvent, EventBus};
use crate::frame::Frame;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, error, info, warn};

/// Hardware or synthetic provider of single-shot frames
#[async_trait]
pub trait FrameSource: Send {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Acquire the device. Failure here disables capture for the session.
    async fn bind(&mut self) -> Result<(), CameraError>;

    /// Release the device; must be safe to call when not bound
    async fn unbind(&mut self);

    /// Take one shot
    async fn capture(&mut self) -> Result<Frame, CameraError>;
}

#[derive(Debug, Clone, PartialEq)]
enum BindState {
    Unbound,
    Bound,
    /// Cached initialization failure
    Failed(String),
}

/// Owns the frame source binding for the lifetime of a capture screen
pub struct FrameCapture {
    source: Box<dyn FrameSource>,
    state: BindState,
    event_bus: Option<Arc<EventBus>>,
}

impl FrameCapture {
    pub fn new(source: Box<dyn FrameSource>) -> Self {
        Self {
            source,
            state: BindState::Unbound,
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Bind the source, releasing any previous binding first.
    ///
    /// Every successful setup rebinds from scratch. An initialization failure
    /// is cached for the session: later setups, releases and captures leave
    /// the hardware alone, and only a new `FrameCapture` binds again.
    pub async fn setup(&mut self) -> Result<(), CameraError> {
        if let BindState::Failed(details) = &self.state {
            debug!("Skipping setup of '{}': cached failure", self.source.name());
            return Err(CameraError::Initialization {
                details: details.clone(),
            });
        }

        self.source.unbind().await;
        self.state = BindState::Unbound;

        match self.source.bind().await {
            Ok(()) => {
                info!("Frame source '{}' bound", self.source.name());
                self.state = BindState::Bound;
                self.publish_status(true);
                Ok(())
            }
            Err(e) => {
                error!("Frame source '{}' failed to bind: {}", self.source.name(), e);
                let details = match &e {
                    CameraError::Initialization { details } => details.clone(),
                    other => other.to_string(),
                };
                self.state = BindState::Failed(details.clone());
                self.publish_status(false);
                Err(CameraError::Initialization { details })
            }
        }
    }

    /// Take one shot; refused outright when setup failed or never ran
    pub async fn capture(&mut self) -> Result<Frame, CameraError> {
        match &self.state {
            BindState::Failed(details) => Err(CameraError::Unavailable {
                reason: details.clone(),
            }),
            BindState::Unbound => Err(CameraError::NotBound),
            BindState::Bound => {
                let frame = self.source.capture().await.map_err(|e| match e {
                    CameraError::Capture { .. } => e,
                    other => CameraError::Capture {
                        details: other.to_string(),
                    },
                })?;
                debug!(
                    "Captured frame {} ({}x{}, {:?}, rotation {})",
                    frame.id,
                    frame.width,
                    frame.height,
                    frame.format,
                    frame.rotation.degrees()
                );
                Ok(frame)
            }
        }
    }

    /// Release the source; safe to call repeatedly
    pub async fn release(&mut self) {
        if self.state == BindState::Bound {
            self.source.unbind().await;
            self.state = BindState::Unbound;
            info!("Frame source '{}' released", self.source.name());
        }
    }

    /// Whether a capture may be attempted
    pub fn is_available(&self) -> bool {
        self.state == BindState::Bound
    }

    /// Whether setup failed and capture is disabled for the session
    pub fn initialization_failed(&self) -> bool {
        matches!(self.state, BindState::Failed(_))
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    fn publish_status(&self, available: bool) {
        if let Some(bus) = &self.event_bus {
            bus.publish(ClosetEvent::CameraStatusChanged {
                available,
                timestamp: SystemTime::now(),
            });
        } else if !available {
            warn!("Camera unavailable and no event bus attached");
        }
    }
}
