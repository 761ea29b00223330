//! Per-run execution state
//!
//! An `ExecutionContext` is created fresh for every run and owned by the run
//! for its whole lifetime. It threads the previous step's output forward and
//! collects the trace.

use crate::workflow::types::NodeKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Error,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Success => "success",
            StepStatus::Error => "error",
        }
    }
}

/// One trace entry per executed node, in execution order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub node_id: String,
    pub kind: NodeKind,
    /// What the handler received
    pub input: Value,
    /// What the handler produced (becomes the next step's input)
    pub output: Value,
    /// Wall time of the handler's own logic
    pub elapsed_ms: u64,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Mutable state threaded through one run
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub workflow_id: String,
    pub session_id: String,
    user_query: String,
    /// Output of the last executed step; `None` before the first step
    pub current_data: Option<Value>,
    trace: Vec<StepRecord>,
}

impl ExecutionContext {
    /// Create an empty context for a new run
    pub fn new(
        workflow_id: impl Into<String>,
        session_id: impl Into<String>,
        user_query: impl Into<String>,
    ) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            session_id: session_id.into(),
            user_query: user_query.into(),
            current_data: None,
            trace: Vec::new(),
        }
    }

    /// The question the run was started with
    pub fn user_query(&self) -> &str {
        &self.user_query
    }

    /// Read a non-empty string field of the current data
    pub fn current_str(&self, key: &str) -> Option<&str> {
        self.current_data
            .as_ref()
            .and_then(|d| d.get(key))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    /// Snapshot of the current data for trace and log entries
    pub fn current_snapshot(&self) -> Value {
        self.current_data.clone().unwrap_or(Value::Null)
    }

    /// Append a step to the trace
    pub fn record(&mut self, step: StepRecord) {
        self.trace.push(step);
    }

    pub fn trace(&self) -> &[StepRecord] {
        &self.trace
    }

    /// Consume the context, keeping only the trace
    pub fn into_trace(self) -> Vec<StepRecord> {
        self.trace
    }

    /// Sum of all recorded step durations
    pub fn total_elapsed_ms(&self) -> u64 {
        self.trace.iter().map(|s| s.elapsed_ms).sum()
    }

    /// Catalog names of recorded steps, in execution order
    pub fn components_used(&self) -> Vec<&'static str> {
        self.trace.iter().map(|s| s.kind.as_str()).collect()
    }
}
