pub mod backend;
pub mod budget;
pub mod capture;
pub mod cpal_input;
pub mod file;

pub use backend::{AudioInput, InputConfig};
pub use budget::{CaptureBudget, CaptureBudgetPlanner, MemoryProbe, SystemMemory};
pub use capture::{convert_sample, AudioCapturer, CaptureSettings, Recording, SampleBuffer};
pub use cpal_input::CpalInput;
pub use file::{WaveEncoder, WaveFile, WAV_HEADER_LEN};
