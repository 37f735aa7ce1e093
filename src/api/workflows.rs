/// Workflow management REST API endpoints
///
/// Thin handlers over the workflow orchestrator: save, delete, find, list.

use crate::{
    api::AppState,
    workflow::types::{
        Workflow, WorkflowCreateInput, WorkflowExists, WorkflowListInput, WorkflowNotFound,
        WorkflowPage, WorkflowView,
    },
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};

/// Response for workflow creation
#[derive(Debug, Serialize)]
pub struct WorkflowResponse {
    pub id: i64,
    pub message: String,
    pub workflow: WorkflowView,
}

/// Create workflow management routes
pub fn create_workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/api/workflows", get(list_workflows).post(create_workflow))
        .route("/api/workflows/{id}", get(get_workflow).delete(delete_workflow))
}

/// Create a workflow and its cluster resources
///
/// POST /api/workflows
/// Body: { "name": "...", "namespace": "...", "type": "Ingress", ... }
async fn create_workflow(
    State(state): State<AppState>,
    Json(input): Json<WorkflowCreateInput>,
) -> Result<Json<WorkflowResponse>, StatusCode> {
    if let Err(e) = input.validate() {
        tracing::warn!("Rejected workflow {}: {}", input.name, e);
        return Err(StatusCode::BAD_REQUEST);
    }

    match state.workflows.save(&input).await {
        Ok(workflow) => Ok(Json(created(&workflow))),
        Err(e) if e.downcast_ref::<WorkflowExists>().is_some() => Err(StatusCode::CONFLICT),
        Err(e) => {
            tracing::error!("Failed to save workflow {}/{}: {:#}", input.namespace, input.name, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn created(workflow: &Workflow) -> WorkflowResponse {
    WorkflowResponse {
        id: workflow.id,
        message: format!("Workflow '{}' created successfully", workflow.name),
        workflow: WorkflowView::from(workflow),
    }
}

/// List workflows
///
/// GET /api/workflows?filter_name=web&page=1&limit=10
/// Returns: { "items": [...], "total": 3 }
async fn list_workflows(
    State(state): State<AppState>,
    Query(filter): Query<WorkflowListInput>,
) -> Result<Json<WorkflowPage>, StatusCode> {
    match state.workflows.find_list(&filter).await {
        Ok(page) => Ok(Json(page)),
        Err(e) => {
            tracing::error!("Failed to list workflows: {:#}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /api/workflows/{id}
async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<WorkflowView>, StatusCode> {
    match state.workflows.find(id).await {
        Ok(Some(workflow)) => Ok(Json(WorkflowView::from(&workflow))),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to get workflow {}: {:#}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Delete a workflow, its cluster resources first
///
/// DELETE /api/workflows/{id}
async fn delete_workflow(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, StatusCode> {
    match state.workflows.delete(id).await {
        Ok(()) => Ok(Json(json!({ "message": "Workflow deleted successfully" }))),
        Err(e) if e.downcast_ref::<WorkflowNotFound>().is_some() => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to delete workflow {}: {:#}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
