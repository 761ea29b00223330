/// Workflow Management Layer
///
/// This module handles workflow definitions and their persistence:
/// - Type definitions (WorkflowDefinition, WorkflowNode, NodeKind, WorkflowEdge)
/// - SQLite persistence with sqlx for workflows, documents, chat and logs

// Core workflow type definitions
pub mod types;

// SQLite persistence layer
pub mod storage;

// Re-export commonly used types
pub use storage::Store;
pub use types::{NodeKind, WorkflowDefinition, WorkflowEdge, WorkflowNode};
