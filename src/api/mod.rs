/// HTTP API Layer
///
/// This module provides the REST API around the workflow engine. It handles:
/// - Workflow CRUD operations and one-shot execution
/// - Chat sessions that run a workflow per message
/// - Knowledge-base document uploads

// Workflow management and execution endpoints
pub mod workflows;

// Chat endpoints (messages, history, execution logs)
pub mod chat;

// Knowledge-base document endpoints
pub mod documents;

use crate::{
    runtime::{EngineError, ExecutionEngine},
    workflow::{storage::Store, types::WorkflowDefinition},
};
use axum::{http::StatusCode, response::Json, Router};
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};

// Re-export router builders
pub use chat::create_chat_routes;
pub use documents::create_document_routes;
pub use workflows::create_workflow_routes;

/// Application state containing shared resources
#[derive(Debug, Clone)]
pub struct AppState {
    /// SQLite store for workflows, documents, chat and logs
    pub store: Store,
    /// Shared execution engine
    pub engine: Arc<ExecutionEngine>,
    /// Optional wall-clock limit for a whole run
    pub run_timeout: Option<Duration>,
}

/// Error half of every handler result: status plus `{error, details?}` body
pub type ApiError = (StatusCode, Json<Value>);

pub(crate) fn api_error(status: StatusCode, error: &str) -> ApiError {
    (status, Json(json!({ "error": error })))
}

pub(crate) fn api_error_with_details(status: StatusCode, error: &str, details: impl ToString) -> ApiError {
    (
        status,
        Json(json!({ "error": error, "details": details.to_string() })),
    )
}

/// Map a storage failure to a logged 500
pub(crate) fn storage_error(context: &str, err: anyhow::Error) -> ApiError {
    tracing::error!("❌ {}: {}", context, err);
    api_error_with_details(StatusCode::INTERNAL_SERVER_ERROR, context, err)
}

/// All API routes
pub fn create_api_routes() -> Router<AppState> {
    Router::new()
        .merge(create_workflow_routes())
        .merge(create_chat_routes())
        .merge(create_document_routes())
}

/// Run a workflow through the engine, honouring the configured timeout
pub(crate) async fn run_workflow(
    state: &AppState,
    definition: &WorkflowDefinition,
    workflow_id: &str,
    session_id: &str,
    query: &str,
) -> Result<String, EngineError> {
    let run = state
        .engine
        .execute_workflow(definition, workflow_id, session_id, query);

    match state.run_timeout {
        Some(limit) => match tokio::time::timeout(limit, run).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("⏰ Workflow '{}' timed out after {:?}", workflow_id, limit);
                Err(EngineError::execution_failed(format!("run timed out after {:?}", limit)))
            }
        },
        None => run.await,
    }
}
