//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, query)
//!     → prefix.rs (strip the fixed routing prefix)
//!     → upstream.rs (join the remainder onto the upstream origin)
//!     → Return: upstream URI or NoMatch
//! ```
//!
//! # Design Decisions
//! - Exactly one route: one prefix, one upstream origin
//! - Both are fixed at startup, immutable at runtime
//! - Explicit NoMatch rather than silent default

pub mod prefix;
pub mod upstream;

pub use prefix::RoutePrefix;
pub use upstream::Upstream;
