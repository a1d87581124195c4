//! Slack adapter for the gadget bot.
//!
//! Verifies request signatures, decodes Events API and slash command
//! bodies into core events, and talks to the Web API.

mod client;
mod decoder;
mod error;
mod signature;
mod types;

pub use client::{SlackClient, DEFAULT_API_URL};
pub use decoder::SlackEventDecoder;
pub use error::{DecodeError, SignatureError, SlackError};
pub use signature::{SlackSignatureVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER};
pub use types::*;
