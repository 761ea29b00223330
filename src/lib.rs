/// askflow: visual question-answering workflow engine
///
/// This library runs user-built workflows of UserQuery, KnowledgeBase,
/// LLMEngine and Output components and serves them over HTTP.

// Core configuration and setup
pub mod config;

// Workflow management layer - definitions and persistence
pub mod workflow;

// Runtime execution engine - ordering, dispatch and run coordination
pub mod runtime;

// Model provider seam and the simulated client
pub mod llm;

// HTTP API layer - REST endpoints for workflows, chat and documents
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use runtime::{EngineError, ExecutionEngine, NodeExecutor, RunOutcome};
pub use server::start_server;
pub use workflow::{NodeKind, Store, WorkflowDefinition, WorkflowEdge, WorkflowNode};
