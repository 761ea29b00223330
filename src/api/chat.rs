/// Chat REST API endpoints
///
/// Every chat message runs the workflow once. Messages are stored around the
/// run so the history survives failed executions.

use super::{api_error, api_error_with_details, run_workflow, storage_error, ApiError, AppState};
use crate::workflow::{
    storage::ExecutionLogRecord,
    types::{ChatMessage, MessageType},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

/// Shown to the builder once a chat run finished
pub const WORKFLOW_COMPLETE_STEP: &str = "Workflow Complete";

/// Request body for a chat message
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub workflow_id: String,
    pub message: String,
    pub session_id: Option<String>,
}

/// Answer to a chat message
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    pub workflow_step: String,
}

/// Create chat routes
pub fn create_chat_routes() -> Router<AppState> {
    Router::new()
        .route("/api/chat", post(send_message))
        .route("/api/chat/{session_id}/messages", get(session_messages))
        .route("/api/chat/{session_id}/logs", get(session_logs))
}

/// Send a chat message and run the workflow on it
///
/// POST /api/chat
/// Body: { "workflowId": "...", "message": "...", "sessionId": "..." (optional) }
async fn send_message(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if payload.workflow_id.is_empty() || payload.message.trim().is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Workflow ID and message are required",
        ));
    }

    let workflow = match state.store.get_workflow(&payload.workflow_id).await {
        Ok(Some(workflow)) => workflow,
        Ok(None) => return Err(api_error(StatusCode::NOT_FOUND, "Workflow not found")),
        Err(e) => return Err(storage_error("Failed to load workflow", e)),
    };

    let session_id = match payload.session_id.filter(|s| !s.is_empty()) {
        Some(id) => id,
        None => {
            state
                .store
                .create_chat_session(&workflow.id)
                .await
                .map_err(|e| storage_error("Failed to create chat session", e))?
                .id
        }
    };

    state
        .store
        .add_chat_message(&session_id, &payload.message, None, MessageType::User)
        .await
        .map_err(|e| storage_error("Failed to store chat message", e))?;

    tracing::info!("💬 Chat message for workflow {} (session {})", workflow.id, session_id);

    let response = run_workflow(&state, &workflow.definition, &workflow.id, &session_id, &payload.message)
        .await
        .map_err(|e| {
            tracing::error!("❌ Chat run for workflow {} failed: {}", workflow.id, e);
            api_error_with_details(StatusCode::INTERNAL_SERVER_ERROR, "Failed to process chat message", e)
        })?;

    state
        .store
        .add_chat_message(&session_id, &payload.message, Some(&response), MessageType::Assistant)
        .await
        .map_err(|e| storage_error("Failed to store chat response", e))?;

    Ok(Json(ChatResponse {
        response,
        session_id,
        workflow_step: WORKFLOW_COMPLETE_STEP.to_string(),
    }))
}

/// Message history of a session
///
/// GET /api/chat/{session_id}/messages
async fn session_messages(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    state
        .store
        .chat_messages(&session_id)
        .await
        .map(Json)
        .map_err(|e| storage_error("Failed to load chat messages", e))
}

/// Execution logs written by the runs of a session
///
/// GET /api/chat/{session_id}/logs
async fn session_logs(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<ExecutionLogRecord>>, ApiError> {
    state
        .store
        .execution_logs(&session_id)
        .await
        .map(Json)
        .map_err(|e| storage_error("Failed to load execution logs", e))
}
