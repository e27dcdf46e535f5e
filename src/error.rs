//! Typed failures for each phase of a capture session.
//!
//! Every phase returns its own error; `SessionError` gathers them so the
//! controller can log one cause and pick the failure path.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    /// The sample buffer could not be allocated
    #[error("out of memory allocating {samples} samples ({bytes} bytes)")]
    OutOfMemory { samples: u64, bytes: u64 },

    /// The input stream failed to open or read
    #[error("audio stream error: {0}")]
    Stream(String),
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("wav encoding error: {0}")]
    Wav(#[from] hound::Error),
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("delivery endpoint is not configured")]
    NotConfigured,

    #[error("recording {path:?} is missing: {source}")]
    MissingFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("endpoint answered with status {0}")]
    Status(u16),
}

#[derive(Debug, Error)]
pub enum ConnectivityError {
    #[error("{endpoint} unreachable after {attempts} attempts")]
    Unreachable { endpoint: String, attempts: u32 },

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl SessionError {
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self, SessionError::Capture(CaptureError::OutOfMemory { .. }))
    }
}
