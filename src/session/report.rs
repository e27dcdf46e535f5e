use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum SessionOutcome {
    /// Endpoint accepted the recording
    Delivered,
    /// Recording written but the upload failed
    UploadFailed(String),
    /// Capture or encode failed; nothing was uploaded
    RecordFailed(String),
}

impl SessionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SessionOutcome::Delivered)
    }
}

/// Summary of one triggered session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Session identifier used in log lines
    pub id: Uuid,

    /// When the trigger was taken
    pub started_at: DateTime<Utc>,

    /// Configured sample rate in Hz
    pub sample_rate: u32,

    /// Configured duration in seconds
    pub duration_secs: u32,

    /// Samples captured, once recording succeeded
    pub sample_count: Option<u64>,

    /// Calibrated DC offset, once recording succeeded
    pub dc_offset: Option<i32>,

    /// Size of the encoded file on storage
    pub file_bytes: Option<u64>,

    /// Wall time spent in the session
    pub elapsed_secs: f64,

    pub outcome: SessionOutcome,
}
