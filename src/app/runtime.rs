use super::{ClosetOrchestrator, Component, ComponentState, ShutdownReason};
use crate::canvas::{OutfitCanvas, Slot};
use crate::error::{ClosetError, Result};
use crate::storage::Garment;
use crate::upload::{CaptureRequest, PipelineState};
use crate::weather::WeatherReport;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::{info, warn};

impl ClosetOrchestrator {
    /// Run one capture pipeline to its outcome and acknowledge it
    pub async fn capture_garment(&self, request: CaptureRequest) -> Result<PipelineState> {
        let run_id = self.coordinator.start_capture(request)?;
        let outcome = self.coordinator.wait_for_terminal().await?;
        info!("Capture {} finished: {}", run_id, outcome);
        self.coordinator.acknowledge();
        Ok(outcome)
    }

    pub async fn list_garments(&self) -> Result<Vec<Garment>> {
        Ok(self.wardrobe.refresh().await?)
    }

    pub async fn delete_garment(&self, image_url: &str) -> Result<()> {
        Ok(self.wardrobe.delete(image_url).await?)
    }

    /// Current weather at an explicit location, or the configured one
    pub async fn current_weather(&self, location: Option<(f64, f64)>) -> Result<WeatherReport> {
        let report = match location {
            Some((latitude, longitude)) => self.weather.current(latitude, longitude).await?,
            None => self.weather.current_at(&self.config.weather).await?,
        };
        Ok(report)
    }

    /// Shuffle the outfit manually, then optionally listen for shakes.
    ///
    /// Listening ends after `listen` elapses or on Ctrl+C. Returns the final
    /// canvas.
    pub async fn run_outfit_session(
        &mut self,
        shuffles: usize,
        listen: Option<Duration>,
    ) -> Result<OutfitCanvas> {
        for _ in 0..shuffles {
            if self.editor.shuffle() == 0 {
                warn!("Nothing to shuffle: the wardrobe is empty");
                break;
            }
        }

        if let Some(duration) = listen {
            self.set_component_state(Component::Motion, ComponentState::Starting);
            self.editor.resume();
            let state = if self.editor.is_listening() {
                ComponentState::Running
            } else {
                ComponentState::Failed
            };
            self.set_component_state(Component::Motion, state);

            let reason = self.wait_for_shutdown(duration).await;
            info!("Outfit session ended: {:?}", reason);

            self.editor.pause();
            self.set_component_state(Component::Motion, ComponentState::Stopped);
        }

        Ok(self.editor.snapshot())
    }

    /// Draw a new garment for one slot
    pub fn reroll(&self, slot: Slot) -> Result<()> {
        if self.editor.reroll(slot) {
            Ok(())
        } else {
            Err(ClosetError::component("canvas", "the wardrobe is empty"))
        }
    }

    /// Wait for a termination signal, the timeout or cancellation
    pub(super) async fn wait_for_shutdown(&self, timeout: Duration) -> ShutdownReason {
        let deadline = Instant::now() + timeout;
        let token = self.cancellation_token.clone();
        tokio::select! {
            _ = token.cancelled() => ShutdownReason::UserRequest,
            _ = sleep_until(deadline) => ShutdownReason::SessionElapsed,
            signal = tokio::signal::ctrl_c() => match signal {
                Ok(()) => {
                    info!("Received SIGINT signal (Ctrl+C)");
                    ShutdownReason::Signal("SIGINT".to_string())
                }
                Err(e) => {
                    warn!("Failed to listen for Ctrl+C: {}", e);
                    tokio::select! {
                        _ = token.cancelled() => ShutdownReason::UserRequest,
                        _ = sleep_until(deadline) => ShutdownReason::SessionElapsed,
                    }
                }
            },
        }
    }
}
