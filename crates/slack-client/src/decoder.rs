//! Decoding of Events API and slash command bodies.

use crate::error::DecodeError;
use crate::types::{EventEnvelope, SlashCommand};
use gadget_core::{BoxError, CommandInvocation, EventDecoder, InboundEvent};

#[derive(Debug, Clone, Copy, Default)]
pub struct SlackEventDecoder;

impl SlackEventDecoder {
    pub fn new() -> Self {
        Self
    }

    pub fn event(&self, body: &[u8]) -> Result<InboundEvent, DecodeError> {
        let envelope: EventEnvelope = serde_json::from_slice(body)?;
        Ok(envelope.into())
    }

    pub fn command(&self, body: &[u8]) -> Result<CommandInvocation, DecodeError> {
        let command: SlashCommand = serde_urlencoded::from_bytes(body)?;
        Ok(command.into())
    }
}

impl EventDecoder for SlackEventDecoder {
    fn decode_event(&self, body: &[u8]) -> Result<InboundEvent, BoxError> {
        self.event(body).map_err(Into::into)
    }

    fn decode_command(&self, body: &[u8]) -> Result<CommandInvocation, BoxError> {
        self.command(body).map_err(Into::into)
    }
}
