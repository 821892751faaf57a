use crate::config::CanvasConfig;
use crate::storage::Garment;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};
use tracing::debug;

/// Fixed outfit composition positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Top,
    Bottom,
    Shoes,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::Top, Slot::Bottom, Slot::Shoes];

    fn index(self) -> usize {
        match self {
            Slot::Top => 0,
            Slot::Bottom => 1,
            Slot::Shoes => 2,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Top => write!(f, "top"),
            Slot::Bottom => write!(f, "bottom"),
            Slot::Shoes => write!(f, "shoes"),
        }
    }
}

/// 2D displacement in canvas units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    pub x: f32,
    pub y: f32,
}

impl Offset {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for Offset {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl Add for Offset {
    type Output = Offset;

    fn add(self, other: Offset) -> Offset {
        Offset::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign for Offset {
    fn add_assign(&mut self, other: Offset) {
        self.x += other.x;
        self.y += other.y;
    }
}

/// What a slot shows and where
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SlotAssignment {
    pub garment: Option<Garment>,
    pub offset: Offset,
}

/// Three independent garment slots with independent positions.
///
/// Assignment and position are orthogonal: reassigning a slot keeps its
/// accumulated offset, only `reset_positions` restores the defaults.
#[derive(Debug, Clone)]
pub struct OutfitCanvas {
    garments: Vec<Garment>,
    slots: [SlotAssignment; 3],
    default_offsets: [Offset; 3],
}

impl OutfitCanvas {
    pub fn new(config: &CanvasConfig) -> Self {
        let default_offsets = [
            Offset::from(config.top_offset),
            Offset::from(config.bottom_offset),
            Offset::from(config.shoes_offset),
        ];
        Self {
            garments: Vec::new(),
            slots: default_offsets.map(|offset| SlotAssignment {
                garment: None,
                offset,
            }),
            default_offsets,
        }
    }

    /// Replace the collection shuffles draw from; current slots are kept
    pub fn set_garments(&mut self, garments: Vec<Garment>) {
        debug!("Canvas collection set to {} garments", garments.len());
        self.garments = garments;
    }

    pub fn garments(&self) -> &[Garment] {
        &self.garments
    }

    /// Draw a garment for every slot, with replacement.
    ///
    /// Returns the number of slots assigned: zero when the collection is empty,
    /// in which case nothing changes.
    pub fn shuffle(&mut self) -> usize {
        self.shuffle_with(&mut rand::thread_rng())
    }

    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        if self.garments.is_empty() {
            debug!("Shuffle skipped: no garments");
            return 0;
        }
        for slot in Slot::ALL {
            self.slots[slot.index()].garment = self.garments.choose(rng).cloned();
        }
        Slot::ALL.len()
    }

    /// Draw a new garment for one slot only
    pub fn reroll(&mut self, slot: Slot) -> Option<&Garment> {
        self.reroll_with(slot, &mut rand::thread_rng())
    }

    pub fn reroll_with<R: Rng + ?Sized>(&mut self, slot: Slot, rng: &mut R) -> Option<&Garment> {
        let drawn = self.garments.choose(rng).cloned()?;
        let assignment = &mut self.slots[slot.index()];
        assignment.garment = Some(drawn);
        assignment.garment.as_ref()
    }

    /// Add a delta to one slot's position; no clamping
    pub fn drag_slot(&mut self, slot: Slot, delta: Offset) {
        self.slots[slot.index()].offset += delta;
    }

    pub fn reset_positions(&mut self) {
        for slot in Slot::ALL {
            self.slots[slot.index()].offset = self.default_offsets[slot.index()];
        }
    }

    pub fn assignment(&self, slot: Slot) -> &SlotAssignment {
        &self.slots[slot.index()]
    }

    pub fn garment(&self, slot: Slot) -> Option<&Garment> {
        self.slots[slot.index()].garment.as_ref()
    }

    pub fn offset(&self, slot: Slot) -> Offset {
        self.slots[slot.index()].offset
    }
}

impl Default for OutfitCanvas {
    fn default() -> Self {
        Self::new(&CanvasConfig::default())
    }
}
