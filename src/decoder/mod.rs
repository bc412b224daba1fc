//! Incremental decoder for the relay's line-oriented event stream.
//!
//! # Data Flow
//! ```text
//! transport chunks (bytes or text, split anywhere)
//!     → state.rs (append to buffer, cut complete frames)
//!     → frame.rs (keep `data:` lines, detect `[END]`)
//!     → Event::Data ... then Event::End | Event::Error
//!
//! stream.rs wraps the same state machine around any byte Stream.
//! ```
//!
//! # Design Decisions
//! - One decoder per stream; the buffer is never shared
//! - `feed` is synchronous and does no I/O, so event order is arrival order
//! - Lines without the `data:` tag are ignored, not rejected
//! - Payloads are never trimmed; only the sentinel check trims

pub mod frame;
pub mod state;
pub mod stream;

pub use frame::{DATA_TAG, END_SENTINEL};
pub use state::{DecoderState, EndReason, Event, StreamDecoder};
pub use stream::decode_stream;
