//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Relay and decoder produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every relay log event
//! - Metrics are cheap (atomic increments) and a no-op until a recorder is installed

pub mod logging;
pub mod metrics;
