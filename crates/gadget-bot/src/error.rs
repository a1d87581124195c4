//! Error types for the bot server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gadget_core::{DispatchError, RouteError};
use slack_client::SlackError;
use thiserror::Error;
use tracing::{debug, error};
use user_store::StoreError;

/// Startup and runtime errors of the server binary.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Route registration error: {0}")]
    Route(#[from] RouteError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Slack error: {0}")]
    Slack(#[from] SlackError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for application errors.
pub type AppResult<T> = Result<T, AppError>;

/// A dispatch failure rendered as an HTTP response.
///
/// The body is always empty; the platform only looks at the status.
#[derive(Debug)]
pub struct ApiError(pub DispatchError);

impl From<DispatchError> for ApiError {
    fn from(e: DispatchError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status();

        if status.is_server_error() {
            error!(error = %self.0, "Dispatch failed");
        } else {
            debug!(error = %self.0, %status, "Request rejected");
        }

        status.into_response()
    }
}
