use crate::error::EventBusError;
use crate::upload::PipelineState;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use tokio::sync::broadcast;
use tracing::{debug, error, info, trace, warn};

/// Severity of a transient user notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Events that can occur in the wardrobe app
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClosetEvent {
    /// An accepted (debounced) shake gesture
    ShakeDetected { g_force: f64, timestamp_ms: u64 },
    /// The upload pipeline moved to a new state
    PipelineStateChanged {
        run_id: String,
        state: PipelineState,
    },
    /// One transient notification for the user
    Notification {
        level: NotificationLevel,
        message: String,
        timestamp: SystemTime,
    },
    /// The garment list was fetched from the storage service
    GarmentsLoaded { count: usize },
    /// The storage service confirmed a deletion
    GarmentDeleted { image_url: String },
    /// Outfit slots were reassigned
    OutfitShuffled { assigned: usize },
    /// Camera binding status changed
    CameraStatusChanged {
        available: bool,
        timestamp: SystemTime,
    },
    /// A component hit an error it could not absorb
    SystemError { component: String, error: String },
}

impl ClosetEvent {
    /// Convenience constructor for notifications stamped with the current time
    pub fn notification<S: Into<String>>(level: NotificationLevel, message: S) -> Self {
        ClosetEvent::Notification {
            level,
            message: message.into(),
            timestamp: SystemTime::now(),
        }
    }

    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            ClosetEvent::ShakeDetected { g_force, .. } => {
                format!("Shake detected ({:.1} g)", g_force)
            }
            ClosetEvent::PipelineStateChanged { run_id, state } => {
                format!("Pipeline {} -> {}", run_id, state)
            }
            ClosetEvent::Notification { message, .. } => message.clone(),
            ClosetEvent::GarmentsLoaded { count } => format!("{} garments loaded", count),
            ClosetEvent::GarmentDeleted { image_url } => {
                format!("Garment deleted: {}", image_url)
            }
            ClosetEvent::OutfitShuffled { assigned } => {
                format!("Outfit shuffled ({} slots assigned)", assigned)
            }
            ClosetEvent::CameraStatusChanged { available, .. } => {
                format!(
                    "Camera {}",
                    if *available {
                        "available"
                    } else {
                        "unavailable"
                    }
                )
            }
            ClosetEvent::SystemError { component, error } => {
                format!("Error in {}: {}", component, error)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            ClosetEvent::ShakeDetected { .. } => "shake_detected",
            ClosetEvent::PipelineStateChanged { .. } => "pipeline_state_changed",
            ClosetEvent::Notification { .. } => "notification",
            ClosetEvent::GarmentsLoaded { .. } => "garments_loaded",
            ClosetEvent::GarmentDeleted { .. } => "garment_deleted",
            ClosetEvent::OutfitShuffled { .. } => "outfit_shuffled",
            ClosetEvent::CameraStatusChanged { .. } => "camera_status_changed",
            ClosetEvent::SystemError { .. } => "system_error",
        }
    }
}

/// Broadcast hub between the pipeline, the sensors and whatever renders them.
///
/// Events are transient: a subscriber only sees what is published after it
/// subscribed, and one that falls behind loses the oldest events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ClosetEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClosetEvent> {
        self.sender.subscribe()
    }

    /// Subscribe to the events accepted by `filter`
    pub fn subscribe_filtered<S: Into<String>>(&self, filter: EventFilter, name: S) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
            filter,
            name: name.into(),
        }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Never fails and never waits, so it can be called from sensor callbacks.
    /// Returns the number of subscribers reached, zero when nobody listens.
    pub fn publish(&self, event: ClosetEvent) -> usize {
        log_event(&event);
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn has_subscribers(&self) -> bool {
        self.subscriber_count() > 0
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

fn log_event(event: &ClosetEvent) {
    match event {
        ClosetEvent::SystemError { component, error } => {
            error!("System error in {}: {}", component, error)
        }
        ClosetEvent::Notification {
            level: NotificationLevel::Error,
            message,
            ..
        } => warn!("Notification: {}", message),
        ClosetEvent::Notification { message, .. } => info!("Notification: {}", message),
        ClosetEvent::CameraStatusChanged {
            available: false, ..
        } => warn!("Camera unavailable"),
        ClosetEvent::ShakeDetected { .. } | ClosetEvent::CameraStatusChanged { .. } => {
            info!("{}", event.description())
        }
        _ => debug!("{}", event.description()),
    }
}

/// Which events a filtered receiver hands out
#[derive(Debug, Clone)]
pub enum EventFilter {
    All,
    /// Events whose [`ClosetEvent::event_type`] is listed
    EventTypes(Vec<&'static str>),
    /// System errors raised by the listed components
    Components(Vec<String>),
    Custom(fn(&ClosetEvent) -> bool),
}

impl EventFilter {
    pub fn matches(&self, event: &ClosetEvent) -> bool {
        match (self, event) {
            (EventFilter::All, _) => true,
            (EventFilter::EventTypes(types), _) => types.contains(&event.event_type()),
            (EventFilter::Components(components), ClosetEvent::SystemError { component, .. }) => {
                components.contains(component)
            }
            (EventFilter::Components(_), _) => false,
            (EventFilter::Custom(accept), _) => accept(event),
        }
    }
}

/// Subscription that skips events its filter rejects
pub struct EventReceiver {
    receiver: broadcast::Receiver<ClosetEvent>,
    filter: EventFilter,
    name: String,
}

impl EventReceiver {
    /// Wait for the next matching event.
    ///
    /// Falling behind is logged and skipped; only a closed bus is an error.
    pub async fn recv(&mut self) -> Result<ClosetEvent, EventBusError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => {
                    trace!("{} <- {}", self.name, event.event_type());
                    return Ok(event);
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(missed)) => self.lagged(missed),
                Err(broadcast::error::RecvError::Closed) => return Err(EventBusError::ChannelClosed),
            }
        }
    }

    /// Next matching event already queued, if any
    pub fn try_recv(&mut self) -> Result<Option<ClosetEvent>, EventBusError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Ok(Some(event)),
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Lagged(missed)) => self.lagged(missed),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(EventBusError::ChannelClosed)
                }
            }
        }
    }

    fn lagged(&self, missed: u64) {
        warn!("Receiver '{}' missed {} events", self.name, missed);
    }
}
