/// Knowledge-base document endpoints
///
/// Documents arrive as already-extracted plain text.

use super::{api_error, storage_error, ApiError, AppState};
use crate::workflow::{storage::NewDocument, types::Document};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;

const DEFAULT_FILE_TYPE: &str = "text/plain";

/// Request body for a document upload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadDocumentRequest {
    pub workflow_id: String,
    pub filename: String,
    pub content: String,
    pub file_type: Option<String>,
}

/// Create document routes
pub fn create_document_routes() -> Router<AppState> {
    Router::new()
        .route("/api/documents", post(upload_document))
        .route("/api/workflows/{id}/documents", get(list_documents))
}

/// Attach a document to a workflow
///
/// POST /api/documents
/// Body: { "workflowId": "...", "filename": "...", "content": "...", "fileType": "..." (optional) }
async fn upload_document(
    State(state): State<AppState>,
    Json(payload): Json<UploadDocumentRequest>,
) -> Result<(StatusCode, Json<Document>), ApiError> {
    if payload.workflow_id.is_empty() || payload.filename.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Workflow ID and filename are required",
        ));
    }

    let document = state
        .store
        .create_document(NewDocument {
            filename: payload.filename,
            content: payload.content,
            file_type: payload
                .file_type
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_FILE_TYPE.to_string()),
            workflow_id: payload.workflow_id,
        })
        .await
        .map_err(|e| storage_error("Failed to upload document", e))?;

    Ok((StatusCode::CREATED, Json(document)))
}

/// Documents attached to a workflow
///
/// GET /api/workflows/{id}/documents
async fn list_documents(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Document>>, ApiError> {
    state
        .store
        .documents_by_workflow(&id)
        .await
        .map(Json)
        .map_err(|e| storage_error("Failed to list documents", e))
}
