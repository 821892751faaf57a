use super::detector::AccelerationSample;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::SendError};
use tracing::debug;

/// Provider of linear-acceleration samples.
///
/// `open` returns `None` when no sensor exists; callers treat that as a
/// silent no-op rather than an error.
pub trait AccelerometerSource: Send {
    fn name(&self) -> &str;

    fn open(&mut self) -> Option<mpsc::Receiver<AccelerationSample>>;

    /// Stop producing samples; safe to call when not open
    fn close(&mut self) {}
}

/// Device without an accelerometer
#[derive(Debug, Default)]
pub struct NoAccelerometer;

impl AccelerometerSource for NoAccelerometer {
    fn name(&self) -> &str {
        "none"
    }

    fn open(&mut self) -> Option<mpsc::Receiver<AccelerationSample>> {
        None
    }
}

/// Sending half of a [`ChannelAccelerometer`].
///
/// Follows the source across reopenings: samples go to whichever listener
/// opened it last, and are rejected while it is closed.
#[derive(Clone, Default)]
pub struct AccelerometerFeed {
    sender: Arc<Mutex<Option<mpsc::Sender<AccelerationSample>>>>,
}

impl AccelerometerFeed {
    pub async fn send(&self, sample: AccelerationSample) -> Result<(), SendError<AccelerationSample>> {
        let sender = self.sender.lock().clone();
        match sender {
            Some(sender) => sender.send(sample).await,
            None => Err(SendError(sample)),
        }
    }

    /// Whether a listener currently holds the source open
    pub fn is_open(&self) -> bool {
        self.sender
            .lock()
            .as_ref()
            .map_or(false, |sender| !sender.is_closed())
    }
}

/// Samples pushed in through an [`AccelerometerFeed`].
///
/// Every `open` starts a fresh channel, so the source can be paused and
/// resumed like a hardware sensor.
pub struct ChannelAccelerometer {
    capacity: usize,
    feed: AccelerometerFeed,
}

impl ChannelAccelerometer {
    pub fn new(capacity: usize) -> (AccelerometerFeed, Self) {
        let feed = AccelerometerFeed::default();
        (
            feed.clone(),
            Self {
                capacity: capacity.max(1),
                feed,
            },
        )
    }
}

impl AccelerometerSource for ChannelAccelerometer {
    fn name(&self) -> &str {
        "channel"
    }

    fn open(&mut self) -> Option<mpsc::Receiver<AccelerationSample>> {
        let (sender, receiver) = mpsc::channel(self.capacity);
        if self.feed.sender.lock().replace(sender).is_some() {
            debug!("Channel accelerometer reopened without close");
        }
        Some(receiver)
    }

    fn close(&mut self) {
        self.feed.sender.lock().take();
    }
}
