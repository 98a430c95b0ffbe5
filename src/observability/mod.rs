//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Proxy calls produce:
//!     → logging.rs (subscriber setup for structured events)
//!     → metrics.rs (counters, gauges, histograms)
//!     → tracing.rs (one span per call with a call id)
//! ```
//!
//! # Design Decisions
//! - The library only emits; installing a subscriber or recorder is the
//!   application's choice
//! - Metrics are cheap when no recorder is installed

pub mod logging;
pub mod metrics;
pub mod tracing;
