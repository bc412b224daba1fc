//! Response handling and error mapping.
//!
//! # Responsibilities
//! - Relay the upstream response head and body untouched
//! - Map relay failures to a single well-formed JSON error response
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Upstream error statuses are relayed, never remapped
//! - Every relay-side failure ends in a response, never a hung connection

use std::time::Duration;

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hyper::body::Incoming;
use serde_json::json;
use thiserror::Error;

/// Message returned to callers for every upstream-side failure.
pub const STREAMING_ERROR: &str = "Streaming service error.";

/// Failure status for every upstream-side failure.
pub const FAILURE_STATUS: StatusCode = StatusCode::INTERNAL_SERVER_ERROR;

/// Errors produced while relaying a single request.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("path `{0}` is outside the relay prefix")]
    InvalidRoute(String),

    #[error("invalid upstream URI: {0}")]
    InvalidUpstreamUri(String),

    #[error("failed to connect to upstream: {0}")]
    Connect(String),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    #[error("upstream request failed: {0}")]
    Upstream(String),
}

impl RelayError {
    /// Classify a client error: connection failures are distinct from
    /// failures on an established connection.
    pub fn from_client(err: &hyper_util::client::legacy::Error) -> Self {
        let message = match std::error::Error::source(err) {
            Some(source) => format!("{err}: {source}"),
            None => err.to_string(),
        };
        if err.is_connect() {
            RelayError::Connect(message)
        } else {
            RelayError::Upstream(message)
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::InvalidRoute(_) => "route",
            RelayError::InvalidUpstreamUri(_) => "uri",
            RelayError::Connect(_) => "connect",
            RelayError::Timeout(_) => "timeout",
            RelayError::Upstream(_) => "upstream",
        }
    }

    /// Status returned to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::InvalidRoute(_) => StatusCode::NOT_FOUND,
            _ => FAILURE_STATUS,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let error = match self {
            RelayError::InvalidRoute(_) => "No matching route found.",
            _ => STREAMING_ERROR,
        };
        let body = json!({
            "error": error,
            "detail": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

/// Hand the upstream response to the caller: same status, same headers,
/// same live body.
pub fn relay_response(upstream: hyper::Response<Incoming>) -> Response {
    let (parts, body) = upstream.into_parts();
    Response::from_parts(parts, Body::new(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::CONTENT_TYPE;

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_connect_error_response() {
        let response = RelayError::Connect("connection refused".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "application/json");

        let body = json_body(response).await;
        assert_eq!(body["error"], STREAMING_ERROR);
        assert!(body["detail"].as_str().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_route_error_response() {
        let response = RelayError::InvalidRoute("/elsewhere".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert!(body["error"].is_string());
    }

    #[test]
    fn test_timeout_maps_to_failure_status() {
        let err = RelayError::Timeout(Duration::from_secs(3));
        assert_eq!(err.status(), FAILURE_STATUS);
        assert_eq!(err.kind(), "timeout");
    }
}
