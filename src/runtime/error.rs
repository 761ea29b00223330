//! Coordinator-level errors
//!
//! Step-level failures (retrieval, model calls) never show up here; they are
//! folded into degraded step outputs. Only faults that abort a run do.

use thiserror::Error;

/// Errors surfaced by `ExecutionEngine` to its callers
#[derive(Debug, Error)]
pub enum EngineError {
    /// The run aborted; no further steps were executed
    #[error("Workflow execution failed: {message}")]
    ExecutionFailed { message: String },
}

impl EngineError {
    /// Create an execution failure from any cause
    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            message: message.into(),
        }
    }
}
