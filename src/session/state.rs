use std::fmt;

/// Phases of one capture-encode-deliver cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Waiting for a trigger
    #[default]
    Idle,
    /// Capturing and encoding
    Recording,
    /// File written, about to upload
    Recorded,
    /// Capture or encode failed
    RecordFailed,
    /// Upload in flight
    Uploading,
    /// Endpoint accepted the upload
    Delivered,
    /// Upload failed or was rejected
    UploadFailed,
}

impl SessionState {
    /// Whether `next` is a legal successor of `self`
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Idle, Recording)
                | (Recording, Recorded)
                | (Recording, RecordFailed)
                | (RecordFailed, Idle)
                | (Recorded, Uploading)
                | (Uploading, Delivered)
                | (Uploading, UploadFailed)
                | (Delivered, Idle)
                | (UploadFailed, Idle)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::Recording => write!(f, "Recording"),
            SessionState::Recorded => write!(f, "Recorded"),
            SessionState::RecordFailed => write!(f, "RecordFailed"),
            SessionState::Uploading => write!(f, "Uploading"),
            SessionState::Delivered => write!(f, "Delivered"),
            SessionState::UploadFailed => write!(f, "UploadFailed"),
        }
    }
}
