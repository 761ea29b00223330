//! Collaborator contracts consumed by the engine
//!
//! The engine never talks to a database or a model provider directly. It goes
//! through these traits, which the SQLite store, the provider clients and the
//! test doubles implement.

use crate::runtime::context::StepStatus;
use crate::workflow::types::Document;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Source of the documents attached to a workflow
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents attached to the workflow, in storage order
    async fn get_documents(&self, workflow_id: &str) -> Result<Vec<Document>>;
}

/// Durable audit write for a single executed step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionLogEntry {
    pub workflow_id: String,
    pub session_id: String,
    /// Catalog name of the executed component
    pub component_type: String,
    pub input: Value,
    pub output: Value,
    pub elapsed_ms: u64,
    pub status: StepStatus,
    pub error_message: Option<String>,
}

/// Best-effort sink for execution log entries
///
/// A failed write is reported back but never aborts a run.
#[async_trait]
pub trait ExecutionLogSink: Send + Sync {
    async fn log_execution_step(&self, entry: &ExecutionLogEntry) -> Result<()>;
}

/// Picks the documents relevant to a query
pub trait RelevanceMatcher: Send + Sync {
    /// Return the matching documents, keeping the input order
    fn select<'a>(&self, query: &str, documents: &'a [Document]) -> Vec<&'a Document>;
}

/// Case-insensitive substring containment over a document's full text
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMatcher;

impl RelevanceMatcher for SubstringMatcher {
    fn select<'a>(&self, query: &str, documents: &'a [Document]) -> Vec<&'a Document> {
        let needle = query.to_lowercase();
        documents
            .iter()
            .filter(|doc| doc.content.to_lowercase().contains(&needle))
            .collect()
    }
}
