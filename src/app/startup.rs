use super::{ClosetOrchestrator, Component, ComponentState};
use crate::error::Result;
use crate::events::ClosetEvent;
use tracing::{info, warn};

impl ClosetOrchestrator {
    /// Bind the camera and load the wardrobe.
    ///
    /// Neither failure is fatal: without a camera the app falls back to manual
    /// entry, and an unreachable storage service leaves the wardrobe empty.
    pub async fn initialize(&mut self) -> Result<()> {
        info!("Initializing SmartCloset components");

        for component in Component::ALL {
            self.set_component_state(component, ComponentState::Stopped);
        }

        self.set_component_state(Component::Camera, ComponentState::Starting);
        let camera_result = self.capture.lock().await.setup().await;
        match camera_result {
            Ok(()) => {
                self.set_component_state(Component::Camera, ComponentState::Running);
            }
            Err(e) => {
                warn!("Camera unavailable, capture disabled for this session: {}", e);
                self.set_component_state(Component::Camera, ComponentState::Failed);
                self.event_bus.publish(ClosetEvent::SystemError {
                    component: Component::Camera.to_string(),
                    error: e.to_string(),
                });
            }
        }

        self.set_component_state(Component::Wardrobe, ComponentState::Starting);
        match self.editor.load(&self.wardrobe).await {
            Ok(count) => {
                info!("Wardrobe loaded with {} garments", count);
                self.set_component_state(Component::Wardrobe, ComponentState::Running);
            }
            Err(e) => {
                warn!("Wardrobe not loaded: {}", e);
                self.set_component_state(Component::Wardrobe, ComponentState::Failed);
                self.event_bus.publish(ClosetEvent::SystemError {
                    component: Component::Wardrobe.to_string(),
                    error: e.to_string(),
                });
            }
        }

        let degraded = self.degraded_components();
        if degraded.is_empty() {
            info!("All components initialized");
        } else {
            warn!("Initialized without: {:?}", degraded);
        }
        Ok(())
    }
}
