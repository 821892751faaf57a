mod editor;
mod layout;

pub use editor::OutfitEditor;
pub use layout::{Offset, OutfitCanvas, Slot, SlotAssignment};
