//! Request logging middleware.

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{debug, info_span, warn, Instrument};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Response marker: a Denied Route replaced the selected one.
#[derive(Debug, Clone, Copy)]
pub struct AccessDenied;

/// Logging middleware for requests.
///
/// Runs the request inside a span carrying a fresh `request_id`, so
/// handler tasks spawned while serving it log under the same id.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let span = info_span!("request", %request_id);

    async move {
        let start = Instant::now();
        debug!(%method, %uri, "Request started");

        let mut response = next.run(request).await;

        let duration = start.elapsed();
        let status = response.status();
        let access = if response.extensions().get::<AccessDenied>().is_some() {
            "denied"
        } else {
            "granted"
        };

        if status.is_success() {
            debug!(%method, %uri, %status, ?duration, access, "Request completed");
        } else {
            warn!(%method, %uri, %status, ?duration, access, "Request failed");
        }

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }

        response
    }
    .instrument(span)
    .await
}
