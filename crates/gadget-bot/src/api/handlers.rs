//! HTTP request handlers.

use super::middleware::AccessDenied;
use super::types::{EphemeralResponse, HealthResponse};
use super::AppState;
use crate::error::ApiError;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use gadget_core::{Dispatch, Outcome};

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        routes: state.dispatcher.registry().len(),
    })
}

/// Events API webhook: URL verification and event callbacks.
pub async fn events(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let dispatch = state.dispatcher.handle_event(&headers, &body).await?;
    Ok(render(dispatch))
}

/// Slash command webhook.
pub async fn commands(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let dispatch = state.dispatcher.handle_command(&headers, &body).await?;
    Ok(render(dispatch))
}

/// Turn a dispatch result into the webhook reply. The handler task, if
/// any, keeps running after the response is sent.
fn render(dispatch: Dispatch) -> Response {
    let mut response = match dispatch.outcome {
        Outcome::Challenge(challenge) => challenge.into_response(),
        Outcome::Ephemeral(text) => Json(EphemeralResponse::new(text)).into_response(),
        Outcome::Accepted | Outcome::Ignored | Outcome::Empty => StatusCode::OK.into_response(),
    };

    if dispatch.denied {
        response.extensions_mut().insert(AccessDenied);
    }

    response
}
