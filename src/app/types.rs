use std::fmt;

/// Parts of the app whose availability is tracked across a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Camera,
    Wardrobe,
    Motion,
}

impl Component {
    pub const ALL: [Component; 3] = [Component::Camera, Component::Wardrobe, Component::Motion];

    pub fn name(self) -> &'static str {
        match self {
            Component::Camera => "camera",
            Component::Wardrobe => "wardrobe",
            Component::Motion => "motion",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Component lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComponentState {
    #[default]
    Stopped,
    Starting,
    Running,
    Stopping,
    /// Unavailable for the rest of the session; the app keeps going without it
    Failed,
}

/// Why an interactive session ended
#[derive(Debug, Clone, PartialEq)]
pub enum ShutdownReason {
    Signal(String),
    SessionElapsed,
    UserRequest,
}
