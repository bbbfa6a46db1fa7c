//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! executor + workflow produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout
//!     → optional Prometheus scrape endpoint for long soak runs
//! ```

pub mod logging;
pub mod metrics;
