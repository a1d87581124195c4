use http::StatusCode;
use thiserror::Error;
use user_store::StoreError;

/// Boxed error returned by collaborator implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Route registration failures. These abort startup.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("Route {name:?} has an invalid pattern: {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("Route has no name")]
    MissingName,

    #[error("Command route {0:?} has no command token")]
    MissingCommand(String),
}

/// Bot-identity extraction failures.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Bot identity not present in authorizations")]
    NotPresent,

    #[error("Unparseable event envelope: {0}")]
    Unparseable(#[from] serde_json::Error),
}

/// Per-request failures surfaced to the HTTP caller.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Authentication failed: {0}")]
    Authentication(#[source] BoxError),

    #[error("Malformed input: {0}")]
    MalformedInput(#[source] BoxError),

    #[error("Unparseable event: {0}")]
    UnparseableEvent(#[source] BoxError),

    #[error("No route matched")]
    NoRouteMatched,

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl DispatchError {
    /// HTTP status reported for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::Authentication(_) => StatusCode::UNAUTHORIZED,
            DispatchError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            DispatchError::NoRouteMatched => StatusCode::NOT_FOUND,
            DispatchError::UnparseableEvent(_)
            | DispatchError::Identity(_)
            | DispatchError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_error_status() {
        assert_eq!(
            DispatchError::Authentication("bad signature".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            DispatchError::MalformedInput("bad form".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            DispatchError::UnparseableEvent("bad json".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(DispatchError::NoRouteMatched.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            DispatchError::from(IdentityError::NotPresent).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            DispatchError::from(StoreError::GroupNotFound("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
