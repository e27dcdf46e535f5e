//! Capture session management
//!
//! This module provides the `SessionController` that sequences:
//! - trigger polling and debounced edge consumption
//! - capture and WAV encoding ("record process")
//! - connectivity check and webhook delivery
//! - indicator colours at every phase boundary

mod controller;
mod report;
mod state;

pub use controller::{SessionController, SessionParts};
pub use report::{SessionOutcome, SessionReport};
pub use state::SessionState;
