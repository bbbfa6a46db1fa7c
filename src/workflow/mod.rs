//! Validator workflow subsystem.
//!
//! # Data Flow
//! ```text
//! HarnessConfig.workflow
//!     → pipeline.rs (ordered stages, shared PipelineState)
//!     → manager.rs (validator operations, view queries)
//!     → TransactionExecutor (one transaction per operation step)
//!     → RunReport (stage records, explorer links)
//! ```

pub mod manager;
pub mod pipeline;

pub use manager::{ValidationManager, MAX_SCORE};
pub use pipeline::{Pipeline, PipelineState, Stage};
