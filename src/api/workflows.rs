/// Workflow management REST API endpoints
///
/// Provides CRUD operations for workflow definitions and a one-shot execute
/// endpoint that runs a stored workflow against a single question.

use super::{api_error, api_error_with_details, run_workflow, storage_error, ApiError, AppState};
use crate::workflow::types::{StoredWorkflow, WorkflowDefinition};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Request body for workflow creation
#[derive(Debug, Deserialize)]
pub struct CreateWorkflowRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub definition: WorkflowDefinition,
}

/// Request body for workflow updates; absent fields are left untouched
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkflowRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub definition: Option<WorkflowDefinition>,
    pub is_active: Option<bool>,
}

/// Request body for one-shot execution
#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    #[serde(default)]
    pub query: String,
}

/// Response of one-shot execution
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub response: String,
    pub workflow_id: String,
    pub session_id: String,
    pub executed_at: String,
}

/// Create workflow management routes
pub fn create_workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/api/workflows", post(create_workflow).get(list_workflows))
        .route(
            "/api/workflows/{id}",
            get(get_workflow).put(update_workflow).delete(delete_workflow),
        )
        .route("/api/workflows/{id}/execute", post(execute_workflow))
}

/// Create a new workflow
///
/// POST /api/workflows
/// Body: { "name": "...", "description": "...", "definition": { "nodes": [...], "edges": [...] } }
async fn create_workflow(
    State(state): State<AppState>,
    Json(payload): Json<CreateWorkflowRequest>,
) -> Result<(StatusCode, Json<StoredWorkflow>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Workflow name is required"));
    }

    let workflow = state
        .store
        .create_workflow(&payload.name, &payload.description, &payload.definition)
        .await
        .map_err(|e| storage_error("Failed to create workflow", e))?;

    tracing::info!(
        "🔥 Created workflow: {} ({}) with {} nodes",
        workflow.id,
        workflow.name,
        workflow.definition.nodes.len()
    );

    Ok((StatusCode::CREATED, Json(workflow)))
}

/// List all workflows
///
/// GET /api/workflows
async fn list_workflows(State(state): State<AppState>) -> Result<Json<Vec<StoredWorkflow>>, ApiError> {
    state
        .store
        .list_workflows()
        .await
        .map(Json)
        .map_err(|e| storage_error("Failed to list workflows", e))
}

/// Get a specific workflow by ID
///
/// GET /api/workflows/{id}
async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StoredWorkflow>, ApiError> {
    match state.store.get_workflow(&id).await {
        Ok(Some(workflow)) => Ok(Json(workflow)),
        Ok(None) => Err(api_error(StatusCode::NOT_FOUND, "Workflow not found")),
        Err(e) => Err(storage_error("Failed to get workflow", e)),
    }
}

/// Update an existing workflow
///
/// PUT /api/workflows/{id}
async fn update_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateWorkflowRequest>,
) -> Result<Json<StoredWorkflow>, ApiError> {
    if payload.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(api_error(StatusCode::BAD_REQUEST, "Workflow name cannot be empty"));
    }

    let updated = state
        .store
        .update_workflow(
            &id,
            payload.name.as_deref(),
            payload.description.as_deref(),
            payload.definition.as_ref(),
            payload.is_active,
        )
        .await
        .map_err(|e| storage_error("Failed to update workflow", e))?;

    match updated {
        Some(workflow) => {
            tracing::info!("🔄 Updated workflow: {} ({})", workflow.id, workflow.name);
            Ok(Json(workflow))
        }
        None => Err(api_error(StatusCode::NOT_FOUND, "Workflow not found")),
    }
}

/// Delete a workflow
///
/// DELETE /api/workflows/{id}
async fn delete_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let deleted = state
        .store
        .delete_workflow(&id)
        .await
        .map_err(|e| storage_error("Failed to delete workflow", e))?;

    if !deleted {
        return Err(api_error(StatusCode::NOT_FOUND, "Workflow not found"));
    }

    tracing::info!("🗑️ Deleted workflow: {}", id);
    Ok(Json(json!({ "id": id, "message": "Workflow deleted successfully" })))
}

/// Run a stored workflow against one question in a fresh session
///
/// POST /api/workflows/{id}/execute
/// Body: { "query": "..." }
async fn execute_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    if payload.query.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Query is required"));
    }

    let workflow = match state.store.get_workflow(&id).await {
        Ok(Some(workflow)) => workflow,
        Ok(None) => return Err(api_error(StatusCode::NOT_FOUND, "Workflow not found")),
        Err(e) => return Err(storage_error("Failed to load workflow", e)),
    };

    let session = state
        .store
        .create_chat_session(&workflow.id)
        .await
        .map_err(|e| storage_error("Failed to create chat session", e))?;

    let response = run_workflow(&state, &workflow.definition, &workflow.id, &session.id, &payload.query)
        .await
        .map_err(|e| {
            tracing::error!("❌ Execution of workflow {} failed: {}", workflow.id, e);
            api_error_with_details(StatusCode::INTERNAL_SERVER_ERROR, "Failed to execute workflow", e)
        })?;

    Ok(Json(ExecuteResponse {
        response,
        workflow_id: workflow.id,
        session_id: session.id,
        executed_at: chrono::Utc::now().to_rfc3339(),
    }))
}
