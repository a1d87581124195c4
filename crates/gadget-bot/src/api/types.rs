//! API response types.

use serde::Serialize;

/// Message visible only to the invoking user.
#[derive(Debug, Serialize)]
pub struct EphemeralResponse {
    pub response_type: &'static str,
    pub text: String,
}

impl EphemeralResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            response_type: "ephemeral",
            text: text.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Registered routes, excluding default and denied routes
    pub routes: usize,
}
