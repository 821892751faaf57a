use super::detector::{AccelerationSample, STANDARD_GRAVITY};
use super::source::AccelerometerSource;
use crate::error::MotionError;
use evdev::{AbsoluteAxisType, Device, InputEventKind, Synchronization};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const MAX_CONSECUTIVE_ERRORS: u32 = 5;

/// Accelerometer exposed as an evdev input device (ABS_X/Y/Z).
///
/// Raw axis counts are scaled by `counts_per_g` into m/s².
pub struct EvdevAccelerometer {
    device_path: String,
    counts_per_g: f64,
    running: Arc<AtomicBool>,
}

impl EvdevAccelerometer {
    pub fn new<S: Into<String>>(device_path: S, counts_per_g: f64) -> Self {
        Self {
            device_path: device_path.into(),
            counts_per_g,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    fn open_device(path: &str) -> Result<Device, MotionError> {
        let device = Device::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => MotionError::SensorAbsent,
            _ => MotionError::Device {
                device: path.to_string(),
                details: e.to_string(),
            },
        })?;

        let has_axes = device.supported_absolute_axes().map_or(false, |axes| {
            axes.contains(AbsoluteAxisType::ABS_X)
                && axes.contains(AbsoluteAxisType::ABS_Y)
                && axes.contains(AbsoluteAxisType::ABS_Z)
        });
        if !has_axes {
            return Err(MotionError::Device {
                device: path.to_string(),
                details: "device does not report ABS_X/ABS_Y/ABS_Z".to_string(),
            });
        }
        Ok(device)
    }

    fn read_loop(
        mut device: Device,
        counts_per_g: f64,
        sender: mpsc::Sender<AccelerationSample>,
        running: Arc<AtomicBool>,
    ) {
        let scale = STANDARD_GRAVITY / counts_per_g;
        let mut axes = [0i32; 3];
        let mut consecutive_errors = 0;

        while running.load(Ordering::SeqCst) {
            let events = match device.fetch_events() {
                Ok(events) => {
                    consecutive_errors = 0;
                    events.collect::<Vec<_>>()
                }
                Err(e) => {
                    consecutive_errors += 1;
                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        error!("Giving up on accelerometer after repeated errors: {}", e);
                        break;
                    }
                    warn!(
                        "Error reading accelerometer (attempt {}): {}",
                        consecutive_errors, e
                    );
                    std::thread::sleep(Duration::from_millis(100));
                    continue;
                }
            };

            for event in events {
                match event.kind() {
                    InputEventKind::AbsAxis(AbsoluteAxisType::ABS_X) => axes[0] = event.value(),
                    InputEventKind::AbsAxis(AbsoluteAxisType::ABS_Y) => axes[1] = event.value(),
                    InputEventKind::AbsAxis(AbsoluteAxisType::ABS_Z) => axes[2] = event.value(),
                    InputEventKind::Synchronization(Synchronization::SYN_REPORT) => {
                        let timestamp_ms = event
                            .timestamp()
                            .duration_since(UNIX_EPOCH)
                            .unwrap_or_default()
                            .as_millis() as u64;
                        let sample = AccelerationSample::new(
                            axes[0] as f64 * scale,
                            axes[1] as f64 * scale,
                            axes[2] as f64 * scale,
                            timestamp_ms,
                        );
                        if sender.blocking_send(sample).is_err() {
                            debug!("Accelerometer receiver dropped");
                            return;
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}

impl AccelerometerSource for EvdevAccelerometer {
    fn name(&self) -> &str {
        &self.device_path
    }

    fn open(&mut self) -> Option<mpsc::Receiver<AccelerationSample>> {
        let device = match Self::open_device(&self.device_path) {
            Ok(device) => device,
            Err(e) => {
                warn!("Accelerometer unavailable: {}", e);
                return None;
            }
        };
        info!(
            "Accelerometer opened: {} ({})",
            self.device_path,
            device.name().unwrap_or("Unknown")
        );

        let (sender, receiver) = mpsc::channel(64);
        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let counts_per_g = self.counts_per_g;
        let opened_at = SystemTime::now();

        tokio::task::spawn_blocking(move || {
            Self::read_loop(device, counts_per_g, sender, running);
            debug!(
                "Accelerometer reader exited after {:?}",
                opened_at.elapsed().unwrap_or_default()
            );
        });
        Some(receiver)
    }

    fn close(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
