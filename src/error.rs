//! Errors surfaced to callers of the orchestrator.
//!
//! Stage and document failures are recorded in results, not returned here.
//! These variants cover caller mistakes rejected before any work starts.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("Invalid analysis options: {0}")]
    InvalidOptions(String),
    #[error("Concurrency limit must be at least 1")]
    InvalidConcurrency,
    #[error("Invalid retry policy: {0}")]
    InvalidRetryPolicy(String),
}
