//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → relay.rs (route prefix → upstream URI, single attempt)
//!     → request.rs (strip hop-by-hop headers)
//!     → upstream service
//!     → response.rs (relay head + live body, or JSON error)
//!     → Send to client
//! ```

pub mod relay;
pub mod request;
pub mod response;
pub mod server;

pub use relay::Relay;
pub use request::{forwarded_headers, MakeRelayRequestId, X_REQUEST_ID};
pub use response::{RelayError, FAILURE_STATUS, STREAMING_ERROR};
pub use server::RelayServer;
