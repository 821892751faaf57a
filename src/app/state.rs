use super::{ClosetOrchestrator, Component, ComponentState};
use tracing::debug;

impl ClosetOrchestrator {
    pub(super) fn set_component_state(&self, component: Component, state: ComponentState) {
        let previous = self.component_states.lock().insert(component, state);
        if previous != Some(state) {
            debug!("{} component: {:?} -> {:?}", component, previous.unwrap_or_default(), state);
        }
    }

    /// Lifecycle state of a component; untracked components count as stopped
    pub fn component_state(&self, component: Component) -> ComponentState {
        self.component_states
            .lock()
            .get(&component)
            .copied()
            .unwrap_or_default()
    }

    /// Components that failed and are disabled for the rest of the session
    pub fn degraded_components(&self) -> Vec<Component> {
        let states = self.component_states.lock();
        Component::ALL
            .into_iter()
            .filter(|c| states.get(c) == Some(&ComponentState::Failed))
            .collect()
    }
}
