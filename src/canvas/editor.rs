use super::layout::{Offset, OutfitCanvas, Slot};
use crate::error::StorageError;
use crate::events::{ClosetEvent, EventBus};
use crate::motion::MotionEventFilter;
use crate::storage::Wardrobe;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

/// Outfit screen state: the canvas plus its shake trigger.
///
/// Shake and the manual control both end up in the same shuffle.
pub struct OutfitEditor {
    canvas: Arc<Mutex<OutfitCanvas>>,
    motion: MotionEventFilter,
    event_bus: Arc<EventBus>,
}

impl OutfitEditor {
    pub fn new(canvas: OutfitCanvas, motion: MotionEventFilter, event_bus: Arc<EventBus>) -> Self {
        Self {
            canvas: Arc::new(Mutex::new(canvas)),
            motion,
            event_bus,
        }
    }

    /// Refresh the wardrobe and use it as the shuffle collection
    pub async fn load(&self, wardrobe: &Wardrobe) -> Result<usize, StorageError> {
        let garments = wardrobe.refresh().await?;
        let count = garments.len();
        self.canvas.lock().set_garments(garments);
        Ok(count)
    }

    /// Start listening for shakes
    pub fn resume(&mut self) {
        let canvas = Arc::clone(&self.canvas);
        let event_bus = Arc::clone(&self.event_bus);
        self.motion.start(move |shake| {
            debug!("Shuffling on shake ({:.1} g)", shake.g_force);
            shuffle_and_announce(&canvas, &event_bus);
        });
    }

    /// Release the accelerometer
    pub fn pause(&mut self) {
        self.motion.stop();
    }

    /// Manual shuffle control
    pub fn shuffle(&self) -> usize {
        shuffle_and_announce(&self.canvas, &self.event_bus)
    }

    pub fn reroll(&self, slot: Slot) -> bool {
        self.canvas.lock().reroll(slot).is_some()
    }

    pub fn drag(&self, slot: Slot, delta: Offset) {
        self.canvas.lock().drag_slot(slot, delta);
    }

    pub fn reset_positions(&self) {
        self.canvas.lock().reset_positions();
    }

    /// Copy of the current canvas state
    pub fn snapshot(&self) -> OutfitCanvas {
        self.canvas.lock().clone()
    }

    pub fn is_listening(&self) -> bool {
        self.motion.is_listening()
    }
}

fn shuffle_and_announce(canvas: &Mutex<OutfitCanvas>, event_bus: &EventBus) -> usize {
    let assigned = canvas.lock().shuffle();
    if assigned > 0 {
        info!("Outfit shuffled");
        event_bus.publish(ClosetEvent::OutfitShuffled { assigned });
    }
    assigned
}
