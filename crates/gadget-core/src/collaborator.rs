//! Interfaces the dispatcher consumes from the platform adapter.

use crate::error::BoxError;
use crate::event::{CommandInvocation, InboundEvent};
use http::HeaderMap;

/// Authenticates an inbound webhook request.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), BoxError>;
}

/// Decodes verified request bodies into typed events.
pub trait EventDecoder: Send + Sync {
    /// Decode an event-endpoint body.
    fn decode_event(&self, body: &[u8]) -> Result<InboundEvent, BoxError>;

    /// Decode a command-endpoint body.
    fn decode_command(&self, body: &[u8]) -> Result<CommandInvocation, BoxError>;
}
