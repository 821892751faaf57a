mod orchestrator;
mod runtime;
mod shutdown;
mod startup;
mod state;
mod types;


pub use orchestrator::ClosetOrchestrator;
pub use types::{Component, ComponentState, ShutdownReason};
