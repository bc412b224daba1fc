//! Single-attempt streaming forwarder.
//!
//! # Data Flow
//! ```text
//! inbound Request<Body>
//!     → strip route prefix, join onto upstream origin
//!     → drop hop-by-hop headers
//!     → send with the inbound body still streaming
//!     → upstream Response<Incoming> handed back as-is
//! ```
//!
//! # Design Decisions
//! - No retries and no connection pool: one inbound call, one upstream connection
//! - Only the response head is under a deadline; bodies may stream for minutes
//! - Dropping the returned body drops the upstream connection

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::http::request::{forwarded_headers, request_id};
use crate::http::response::{relay_response, RelayError};
use crate::observability::metrics;
use crate::routing::{RoutePrefix, Upstream};

/// Forwards requests to the configured upstream origin.
#[derive(Clone)]
pub struct Relay {
    client: Client<HttpConnector, Body>,
    upstream: Upstream,
    prefix: RoutePrefix,
    response_timeout: Duration,
}

impl Relay {
    /// Create a relay for the given upstream.
    pub fn new(upstream: &UpstreamConfig, timeouts: &TimeoutConfig) -> Result<Self, RelayError> {
        let target = Upstream::new(&upstream.origin)
            .ok_or_else(|| RelayError::InvalidUpstreamUri(upstream.origin.clone()))?;

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(0)
            .build(connector);

        Ok(Self {
            client,
            upstream: target,
            prefix: RoutePrefix::new(upstream.route_prefix.as_str()),
            response_timeout: Duration::from_secs(timeouts.response_secs),
        })
    }

    /// The upstream this relay forwards to.
    pub fn upstream(&self) -> &Upstream {
        &self.upstream
    }

    /// Forward one request. Never fails: relay-side errors become a JSON
    /// error response.
    pub async fn forward(&self, request: Request<Body>) -> Response {
        let start_time = Instant::now();
        let method = request.method().clone();
        let request_id = request_id(request.headers()).to_string();

        let response = match self.try_forward(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(request_id = %request_id, kind = e.kind(), error = %e, "Relay failed");
                metrics::record_upstream_error(e.kind());
                e.into_response()
            }
        };

        metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
        response
    }

    async fn try_forward(&self, request: Request<Body>) -> Result<Response, RelayError> {
        let (parts, body) = request.into_parts();
        let path = parts.uri.path();

        let upstream_path = self
            .prefix
            .strip(path)
            .ok_or_else(|| RelayError::InvalidRoute(path.to_string()))?;

        let uri = self
            .upstream
            .uri_for(upstream_path, parts.uri.query())
            .map_err(|e| RelayError::InvalidUpstreamUri(e.to_string()))?;

        tracing::debug!(
            request_id = %request_id(&parts.headers),
            method = %parts.method,
            path = %path,
            upstream = %uri,
            "Relaying request"
        );

        let mut forwarded = Request::new(body);
        *forwarded.method_mut() = parts.method;
        *forwarded.uri_mut() = uri;
        *forwarded.headers_mut() = forwarded_headers(&parts.headers);

        let response = tokio::time::timeout(self.response_timeout, self.client.request(forwarded))
            .await
            .map_err(|_| RelayError::Timeout(self.response_timeout))?
            .map_err(|e| RelayError::from_client(&e))?;

        tracing::debug!(
            request_id = %request_id(&parts.headers),
            status = %response.status(),
            "Upstream responded"
        );

        Ok(relay_response(response))
    }
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("upstream", &self.upstream)
            .field("prefix", &self.prefix)
            .field("response_timeout", &self.response_timeout)
            .finish_non_exhaustive()
    }
}
