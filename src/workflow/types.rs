//! Core workflow type definitions
//!
//! Defines the graph a user draws in the builder (nodes, edges, positions) and
//! the records persisted around it. These types are serialized to and from JSON
//! exactly as the builder sends them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A complete workflow graph: the immutable input to a run
///
/// The definition is owned by the persistence layer and only read during
/// execution, so concurrent runs may share one instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Nodes in the order the builder produced them
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    /// Directed dependencies between nodes
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
}

/// A single processing step in the workflow graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowNode {
    /// Unique node identifier within the definition (e.g., "user-query-1")
    pub id: String,
    /// The component kind which determines execution behavior
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Component-specific configuration as flexible JSON
    #[serde(default)]
    pub config: Value,
    /// Canvas position; only the builder cares about it
    #[serde(default)]
    pub position: Position,
}

impl WorkflowNode {
    /// Read a string config value, ignoring blanks
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    /// Read a numeric config value
    pub fn config_f64(&self, key: &str) -> Option<f64> {
        self.config.get(key).and_then(|v| v.as_f64())
    }

    /// Read a boolean config value
    pub fn config_bool(&self, key: &str) -> Option<bool> {
        self.config.get(key).and_then(|v| v.as_bool())
    }
}

/// The closed catalog of component kinds
///
/// - UserQuery: entry point, annotates the raw question
/// - KnowledgeBase: pulls matching documents attached to the workflow
/// - LLMEngine: asks a model provider, optionally with retrieved context
/// - Output: formats the final answer and summarises the run
///
/// Any other kind string the builder sends deserializes to `Unknown` and is
/// skipped by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    UserQuery,
    KnowledgeBase,
    #[serde(rename = "LLMEngine")]
    LlmEngine,
    Output,
    #[serde(other)]
    Unknown,
}

impl NodeKind {
    /// Catalog name as it appears in definitions and execution logs
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::UserQuery => "UserQuery",
            NodeKind::KnowledgeBase => "KnowledgeBase",
            NodeKind::LlmEngine => "LLMEngine",
            NodeKind::Output => "Output",
            NodeKind::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canvas coordinates of a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Connection between two nodes
///
/// `target` consumes the output of `source`. Edges that mention ids missing
/// from the node list are tolerated and never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowEdge {
    /// Source node ID
    pub source: String,
    /// Target node ID
    pub target: String,
}

/// A workflow as stored: metadata plus its graph definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredWorkflow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub definition: WorkflowDefinition,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A document attached to a workflow's knowledge base
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub filename: String,
    /// Extracted plain text
    pub content: String,
    pub file_type: String,
    pub file_size: i64,
    pub workflow_id: String,
    pub upload_date: String,
}

/// A chat session against one workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub workflow_id: String,
    pub created_at: String,
}

/// Who wrote a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    User,
    Assistant,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::User => "user",
            MessageType::Assistant => "assistant",
        }
    }
}

/// A single chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub session_id: String,
    pub message: String,
    pub response: Option<String>,
    pub message_type: MessageType,
    pub created_at: String,
}
