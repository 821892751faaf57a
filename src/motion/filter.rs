use super::detector::{ShakeDetector, ShakeEvent, ShakeState};
use super::source::AccelerometerSource;
use crate::config::MotionConfig;
use crate::events::{ClosetEvent, EventBus};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Listener state while started
struct Listening {
    cancellation_token: CancellationToken,
    task: JoinHandle<()>,
}

/// Debounces accelerometer samples into shake callbacks.
///
/// Owns the sensor exclusively between `start` and `stop`. The debounce
/// window outlives a stop, so a resume right after a shake stays quiet.
pub struct MotionEventFilter {
    config: MotionConfig,
    source: Box<dyn AccelerometerSource>,
    detector: Arc<Mutex<ShakeDetector>>,
    event_bus: Option<Arc<EventBus>>,
    listening: Option<Listening>,
}

impl MotionEventFilter {
    pub fn new(config: MotionConfig, source: Box<dyn AccelerometerSource>) -> Self {
        Self {
            detector: Arc::new(Mutex::new(ShakeDetector::from_config(&config))),
            config,
            source,
            event_bus: None,
            listening: None,
        }
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Begin listening; `on_shake` fires once per accepted shake.
    ///
    /// A missing sensor turns this into a no-op.
    pub fn start<F>(&mut self, on_shake: F)
    where
        F: Fn(ShakeEvent) + Send + Sync + 'static,
    {
        if self.listening.is_some() {
            debug!("Motion filter already started");
            return;
        }

        let Some(mut samples) = self.source.open() else {
            info!(
                "No accelerometer on '{}'; shake detection disabled",
                self.source.name()
            );
            return;
        };

        let detector = Arc::clone(&self.detector);
        let event_bus = self.event_bus.clone();
        let cancellation_token = CancellationToken::new();
        let token = cancellation_token.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    sample = samples.recv() => {
                        let Some(sample) = sample else {
                            debug!("Accelerometer stream ended");
                            break;
                        };
                        let accepted = detector.lock().on_sample(&sample);
                        if let Some(shake) = accepted {
                            if let Some(bus) = &event_bus {
                                bus.publish(ClosetEvent::ShakeDetected {
                                    g_force: shake.g_force,
                                    timestamp_ms: shake.timestamp_ms,
                                });
                            }
                            on_shake(shake);
                        }
                    }
                }
            }
        });

        info!(
            "Shake detection started on '{}' (threshold {} g, debounce {} ms)",
            self.source.name(),
            self.config.shake_threshold_g,
            self.config.debounce_ms
        );
        self.listening = Some(Listening {
            cancellation_token,
            task,
        });
    }

    /// Release the sensor; safe to call repeatedly or before `start`
    pub fn stop(&mut self) {
        if let Some(listening) = self.listening.take() {
            listening.cancellation_token.cancel();
            listening.task.abort();
            self.source.close();
            info!("Shake detection stopped on '{}'", self.source.name());
        }
    }

    /// Forget the last accepted shake
    pub fn reset(&self) {
        self.detector.lock().reset();
    }

    pub fn shake_state(&self) -> ShakeState {
        self.detector.lock().state()
    }

    pub fn is_listening(&self) -> bool {
        self.listening
            .as_ref()
            .map_or(false, |listening| !listening.task.is_finished())
    }
}

impl Drop for MotionEventFilter {
    fn drop(&mut self) {
        self.stop();
    }
}
