use crate::config::MotionConfig;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Standard gravity in m/s²
pub const STANDARD_GRAVITY: f64 = 9.80665;

/// One linear-acceleration reading in m/s²
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccelerationSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Monotonic sample time in milliseconds
    pub timestamp_ms: u64,
}

impl AccelerationSample {
    pub fn new(x: f64, y: f64, z: f64, timestamp_ms: u64) -> Self {
        Self {
            x,
            y,
            z,
            timestamp_ms,
        }
    }

    /// Magnitude of the acceleration vector in units of g
    pub fn g_force(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt() / STANDARD_GRAVITY
    }
}

/// An accepted (debounced) shake
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShakeEvent {
    pub g_force: f64,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShakeState {
    pub last_sample_timestamp: Option<u64>,
    pub last_shake_timestamp: Option<u64>,
}

/// Turns raw samples into discrete shake events.
///
/// A sample is a candidate when its g-force exceeds the threshold. A candidate
/// arriving less than the debounce interval after the last accepted shake is
/// dropped for good; nothing is queued.
#[derive(Debug, Clone)]
pub struct ShakeDetector {
    threshold_g: f64,
    debounce_ms: u64,
    state: ShakeState,
}

impl ShakeDetector {
    pub fn new(threshold_g: f64, debounce_ms: u64) -> Self {
        Self {
            threshold_g,
            debounce_ms,
            state: ShakeState::default(),
        }
    }

    pub fn from_config(config: &MotionConfig) -> Self {
        Self::new(config.shake_threshold_g, config.debounce_ms)
    }

    pub fn on_sample(&mut self, sample: &AccelerationSample) -> Option<ShakeEvent> {
        self.state.last_sample_timestamp = Some(sample.timestamp_ms);

        let g_force = sample.g_force();
        if g_force <= self.threshold_g {
            return None;
        }

        if let Some(last) = self.state.last_shake_timestamp {
            let elapsed = sample.timestamp_ms.saturating_sub(last);
            if elapsed < self.debounce_ms {
                trace!(
                    "Shake candidate ({:.1} g) suppressed {} ms after last shake",
                    g_force,
                    elapsed
                );
                return None;
            }
        }

        self.state.last_shake_timestamp = Some(sample.timestamp_ms);
        Some(ShakeEvent {
            g_force,
            timestamp_ms: sample.timestamp_ms,
        })
    }

    pub fn state(&self) -> ShakeState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = ShakeState::default();
    }
}

impl Default for ShakeDetector {
    fn default() -> Self {
        Self::from_config(&MotionConfig::default())
    }
}
