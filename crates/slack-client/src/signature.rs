//! Slack request signing (v0 HMAC-SHA256).

use crate::error::SignatureError;
use chrono::Utc;
use gadget_core::{BoxError, SignatureVerifier};
use hmac::{Hmac, Mac};
use http::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use std::time::Duration;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const SIGNATURE_HEADER: &str = "x-slack-signature";
const VERSION: &str = "v0";

/// Verifies `X-Slack-Signature` against the signing secret.
pub struct SlackSignatureVerifier {
    secret: SecretString,
    tolerance: Duration,
}

impl SlackSignatureVerifier {
    pub fn new(secret: SecretString, tolerance: Duration) -> Self {
        Self { secret, tolerance }
    }

    /// Check the request headers against the body and the current time.
    pub fn check(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), SignatureError> {
        self.check_at(headers, body, Utc::now().timestamp())
    }

    fn check_at(&self, headers: &HeaderMap, body: &[u8], now: i64) -> Result<(), SignatureError> {
        let timestamp = header(headers, TIMESTAMP_HEADER)?;
        let signature = header(headers, SIGNATURE_HEADER)?;

        let sent_at: i64 = timestamp
            .parse()
            .map_err(|_| SignatureError::InvalidTimestamp)?;
        let age = now.abs_diff(sent_at);
        if age > self.tolerance.as_secs() {
            return Err(SignatureError::Stale(age));
        }

        let expected = signature
            .strip_prefix("v0=")
            .and_then(|hex_sig| hex::decode(hex_sig).ok())
            .ok_or(SignatureError::Malformed)?;

        self.mac(timestamp, body)?
            .verify_slice(&expected)
            .map_err(|_| SignatureError::Mismatch)?;

        debug!("Request signature verified");
        Ok(())
    }

    fn mac(&self, timestamp: &str, body: &[u8]) -> Result<HmacSha256, SignatureError> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| SignatureError::InvalidSecret)?;
        mac.update(VERSION.as_bytes());
        mac.update(b":");
        mac.update(timestamp.as_bytes());
        mac.update(b":");
        mac.update(body);
        Ok(mac)
    }

    /// Produce the `X-Slack-Signature` value for a body.
    pub fn sign(&self, timestamp: &str, body: &[u8]) -> Result<String, SignatureError> {
        let digest = self.mac(timestamp, body)?.finalize().into_bytes();
        Ok(format!("{}={}", VERSION, hex::encode(digest)))
    }
}

impl SignatureVerifier for SlackSignatureVerifier {
    fn verify(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), BoxError> {
        self.check(headers, body).map_err(Into::into)
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, SignatureError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(SignatureError::MissingHeader(name))
}
