//! The bot's own platform identity, discovered from the first callback.

use crate::error::IdentityError;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::info;

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    authorizations: Vec<Authorization>,
}

#[derive(Deserialize)]
struct Authorization {
    #[serde(default)]
    user_id: String,
}

/// Single-assignment cell holding the bot's user id.
///
/// The first successful resolution wins; later calls return the stored
/// value without inspecting their payload.
#[derive(Debug, Default)]
pub struct BotIdentity {
    id: OnceLock<String>,
}

impl BotIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// An identity that is already known.
    pub fn with_id(id: impl Into<String>) -> Self {
        let identity = Self::new();
        let _ = identity.id.set(id.into());
        identity
    }

    pub fn get(&self) -> Option<&str> {
        self.id.get().map(String::as_str)
    }

    /// Resolve the identity from a raw callback envelope, unless known.
    pub fn resolve(&self, raw: &[u8]) -> Result<&str, IdentityError> {
        if let Some(id) = self.get() {
            return Ok(id);
        }

        let id = extract(raw)?;
        let stored = self.id.get_or_init(|| {
            info!(bot_id = %id, "Resolved bot identity");
            id
        });
        Ok(stored)
    }

    /// True if `user` is the bot itself.
    pub fn is_self(&self, user: &str) -> bool {
        self.get().is_some_and(|id| id == user)
    }

    /// Remove every mention of the bot from `text` and trim it.
    pub fn strip_mention(&self, text: &str) -> String {
        match self.get() {
            Some(id) => text.replace(&format!("<@{}>", id), "").trim().to_string(),
            None => text.trim().to_string(),
        }
    }
}

fn extract(raw: &[u8]) -> Result<String, IdentityError> {
    let envelope: Envelope = serde_json::from_slice(raw)?;
    envelope
        .authorizations
        .into_iter()
        .next()
        .map(|auth| auth.user_id)
        .filter(|id| !id.is_empty())
        .ok_or(IdentityError::NotPresent)
}
