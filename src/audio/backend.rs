use crate::config::RecordingConfig;
use crate::error::CaptureError;

/// Configuration for opening a streaming input
#[derive(Debug, Clone)]
pub struct InputConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Always 1; the capture path is mono only
    pub channels: u16,
    /// Driver read-ahead buffer in bytes (raw words are 4 bytes each)
    pub read_ahead_bytes: usize,
    /// Device name, `None` for the default device
    pub device: Option<String>,
}

impl InputConfig {
    pub fn from_recording(config: &RecordingConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            channels: 1,
            read_ahead_bytes: config.read_ahead_bytes,
            device: config.input_device.clone(),
        }
    }

    /// Read-ahead capacity expressed in raw 32-bit words
    pub fn read_ahead_samples(&self) -> usize {
        (self.read_ahead_bytes / std::mem::size_of::<i32>()).max(1)
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self::from_recording(&RecordingConfig::default())
    }
}

/// Streaming audio input trait
///
/// Delivers raw 32-bit words, one per mono sample, as a left-justified
/// serial audio interface would. Implementations:
/// - `CpalInput`: host capture device
/// - test doubles replaying synthetic streams
#[async_trait::async_trait]
pub trait AudioInput: Send {
    /// Open the stream
    async fn start(&mut self, config: &InputConfig) -> Result<(), CaptureError>;

    /// Fill `buf` from the stream, returning the number of words written.
    ///
    /// Zero is a transient condition; the caller retries.
    async fn read(&mut self, buf: &mut [i32]) -> Result<usize, CaptureError>;

    /// Close the stream. Must be a no-op when not open.
    fn stop(&mut self);

    /// Check if the stream is currently open
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}
