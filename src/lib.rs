//! Streaming relay and event-stream decoder.
//!
//! ```text
//! caller ──▶ relay (http) ──▶ upstream service
//!   ▲                              │
//!   └──── decoder ◀── live body ───┘
//! ```
//!
//! The relay is byte-transparent and knows nothing about framing; the decoder
//! only assumes the `data:` / blank-line protocol, no matter which hop
//! produced the bytes.

pub mod config;
pub mod decoder;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::RelayConfig;
pub use decoder::{decode_stream, Event, StreamDecoder};
pub use http::{Relay, RelayServer};
pub use lifecycle::Shutdown;
