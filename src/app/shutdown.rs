use super::{ClosetOrchestrator, Component, ComponentState};
use crate::error::Result;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info};

impl ClosetOrchestrator {
    /// Release the sensors and the camera
    pub async fn shutdown(&mut self) -> Result<i32> {
        info!("Beginning graceful shutdown");

        // Cancel all background waits
        self.cancellation_token.cancel();

        let mut exit_code = 0;

        self.set_component_state(Component::Motion, ComponentState::Stopping);
        self.editor.pause();
        self.set_component_state(Component::Motion, ComponentState::Stopped);

        self.set_component_state(Component::Camera, ComponentState::Stopping);
        let capture = std::sync::Arc::clone(&self.capture);
        let released = timeout(Duration::from_secs(5), async move {
            capture.lock().await.release().await;
        })
        .await;
        match released {
            Ok(()) => {
                self.set_component_state(Component::Camera, ComponentState::Stopped);
                info!("camera component stopped");
            }
            Err(_) => {
                self.set_component_state(Component::Camera, ComponentState::Failed);
                error!("camera component stop timeout");
                exit_code = 1;
            }
        }

        info!("Graceful shutdown completed with exit code: {}", exit_code);
        Ok(exit_code)
    }
}
