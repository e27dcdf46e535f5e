//! Upload of finished recordings
//!
//! The request body is framed by hand so the wire layout stays fixed:
//! one `file` part, `audio/wav`, boundary from configuration.

mod client;
mod payload;

pub use client::{DeliveryAgent, WebhookDelivery};
pub use payload::{is_accepted_status, MultipartPayload};
