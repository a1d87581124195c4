//! Slack adapter errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlackError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error: {0}")]
    Api(String),
}

/// Request signature failures. All of them map to 401.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Missing header {0}")]
    MissingHeader(&'static str),

    #[error("Invalid timestamp header")]
    InvalidTimestamp,

    #[error("Request timestamp is {0}s away from now")]
    Stale(u64),

    #[error("Signature is not v0 hex")]
    Malformed,

    #[error("Signature mismatch")]
    Mismatch,

    #[error("Signing secret is unusable")]
    InvalidSecret,
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Invalid event envelope: {0}")]
    Envelope(#[from] serde_json::Error),

    #[error("Invalid command form: {0}")]
    Command(#[from] serde_urlencoded::de::Error),
}
