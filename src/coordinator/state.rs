/// Capture coordinator states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// No frame held, no review text (capture may be armed)
    Idle,
    /// A frame was captured and is being recognized
    Recognizing,
    /// Cleaned text is ready for the user to save or discard
    Reviewing,
}

impl std::fmt::Display for CaptureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureState::Idle => write!(f, "Idle"),
            CaptureState::Recognizing => write!(f, "Recognizing"),
            CaptureState::Reviewing => write!(f, "Reviewing"),
        }
    }
}

impl Default for CaptureState {
    fn default() -> Self {
        Self::Idle
    }
}
