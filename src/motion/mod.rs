mod detector;
#[cfg(all(feature = "sensors", target_os = "linux"))]
mod evdev_source;
mod filter;
mod source;

pub use detector::{AccelerationSample, ShakeDetector, ShakeEvent, ShakeState, STANDARD_GRAVITY};
#[cfg(all(feature = "sensors", target_os = "linux"))]
pub use evdev_source::EvdevAccelerometer;
pub use filter::MotionEventFilter;
pub use source::{AccelerometerFeed, AccelerometerSource, ChannelAccelerometer, NoAccelerometer};

use crate::config::MotionConfig;

/// Accelerometer for the configured device, or none when unavailable
pub fn accelerometer_from_config(config: &MotionConfig) -> Box<dyn AccelerometerSource> {
    match &config.device {
        #[cfg(all(feature = "sensors", target_os = "linux"))]
        Some(path) => Box::new(EvdevAccelerometer::new(path.clone(), config.counts_per_g)),
        #[cfg(not(all(feature = "sensors", target_os = "linux")))]
        Some(path) => {
            tracing::warn!(
                "Accelerometer '{}' configured but sensor support is not compiled in",
                path
            );
            Box::new(NoAccelerometer)
        }
        None => Box::new(NoAccelerometer),
    }
}
