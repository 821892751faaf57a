mod builder;
mod interface;
mod sources;

pub use builder::FrameCaptureBuilder;
pub use interface::{FrameCapture, FrameSource};
pub use sources::{PlaceholderSource, StillImageSource};
