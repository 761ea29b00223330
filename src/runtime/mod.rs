//! Runtime Execution Engine
//!
//! This module runs workflow definitions. It handles:
//! - Ordering nodes by breadth-first reachability
//! - Dispatching each node to its component handler
//! - Threading step outputs through the execution context
//! - Recording a trace and execution logs for every step

// Run coordinator
pub mod engine;

// Per-kind handlers and the step dispatcher
pub mod executor;

// Graph ordering
pub mod orderer;

// Per-run state and trace records
pub mod context;

// Storage and retrieval contracts the handlers consume
pub mod collaborators;

pub mod error;

// Re-export main types
pub use collaborators::{DocumentStore, ExecutionLogEntry, ExecutionLogSink, RelevanceMatcher, SubstringMatcher};
pub use context::{ExecutionContext, StepRecord, StepStatus};
pub use engine::{ExecutionEngine, RunOutcome};
pub use error::EngineError;
pub use executor::NodeExecutor;
pub use orderer::execution_order;
