pub mod audio;
pub mod config;
pub mod delivery;
pub mod error;
pub mod indicator;
pub mod network;
pub mod session;
pub mod trigger;

pub use audio::{
    AudioCapturer, AudioInput, CaptureBudget, CaptureBudgetPlanner, CaptureSettings, CpalInput,
    InputConfig, MemoryProbe, Recording, SampleBuffer, SystemMemory, WaveEncoder, WaveFile,
};
pub use config::Config;
pub use delivery::{DeliveryAgent, MultipartPayload, WebhookDelivery};
pub use error::{CaptureError, ConnectivityError, DeliveryError, EncodeError, SessionError};
pub use indicator::{Color, Indicator, LogPixel, PixelDriver};
pub use network::{Connectivity, EndpointProbe};
pub use session::{SessionController, SessionOutcome, SessionParts, SessionReport, SessionState};
pub use trigger::TriggerSource;
