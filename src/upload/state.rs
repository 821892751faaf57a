use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline run lifecycle.
///
/// `Idle → Capturing → Processing → Uploading → Succeeded | Failed(reason)`,
/// then back to `Idle` once the outcome is acknowledged. Any stage may jump
/// straight to `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Capturing,
    Processing,
    Uploading,
    Succeeded,
    /// Status code for server failures, transport or stage message otherwise
    Failed(String),
}

impl PipelineState {
    pub fn is_idle(&self) -> bool {
        matches!(self, PipelineState::Idle)
    }

    /// A run is in flight; drives the busy indicator
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            PipelineState::Capturing | PipelineState::Processing | PipelineState::Uploading
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Succeeded | PipelineState::Failed(_))
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "idle"),
            PipelineState::Capturing => write!(f, "capturing"),
            PipelineState::Processing => write!(f, "processing"),
            PipelineState::Uploading => write!(f, "uploading"),
            PipelineState::Succeeded => write!(f, "succeeded"),
            PipelineState::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_and_terminal_are_disjoint() {
        let states = [
            PipelineState::Idle,
            PipelineState::Capturing,
            PipelineState::Processing,
            PipelineState::Uploading,
            PipelineState::Succeeded,
            PipelineState::Failed("500".to_string()),
        ];
        for state in &states {
            assert!(!(state.is_busy() && state.is_terminal()), "{}", state);
        }
        assert_eq!(states.iter().filter(|s| s.is_busy()).count(), 3);
        assert_eq!(states.iter().filter(|s| s.is_terminal()).count(), 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(PipelineState::Uploading.to_string(), "uploading");
        assert_eq!(
            PipelineState::Failed("500".to_string()).to_string(),
            "failed (500)"
        );
    }
}
