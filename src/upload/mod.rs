mod coordinator;
mod state;

#[cfg(test)]
mod tests;

pub use coordinator::{CaptureRequest, UploadCoordinator, SAVED_MESSAGE};
pub use state::PipelineState;
