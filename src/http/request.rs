//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a unique request ID when the caller did not send one
//! - Strip hop-specific headers before forwarding
//! - Leave every other header, including repeated ones, untouched
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - `host` is never forwarded; the client derives it from the upstream URI
//! - Headers named by `connection` are hop-by-hop as well (RFC 9110 §7.6.1)

use axum::http::header::{HeaderMap, HeaderName, HeaderValue, CONNECTION};
use axum::http::Request;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRelayRequestId;

impl MakeRequestId for MakeRelayRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Read the request ID set by the request ID layer.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Headers that describe a single transport hop and never cross the relay.
fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "host"
            | "connection"
            | "keep-alive"
            | "proxy-connection"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Header names listed in the `connection` header.
fn connection_tokens(headers: &HeaderMap) -> Vec<HeaderName> {
    headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect()
}

/// Build the header set sent upstream from the inbound one.
pub fn forwarded_headers(inbound: &HeaderMap) -> HeaderMap {
    let named = connection_tokens(inbound);
    let mut headers = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound {
        if is_hop_by_hop(name) || named.contains(name) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}
