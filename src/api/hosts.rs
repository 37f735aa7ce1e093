/// CMDB host inventory endpoints
///
/// Register, list and remove hosts, and trigger an immediate reachability
/// sweep instead of waiting for the scheduled one.

use crate::{
    api::AppState,
    cmdb::types::{Host, HostCreateInput, HostFilter},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde_json::{json, Value};

pub fn create_host_routes() -> Router<AppState> {
    Router::new()
        .route("/api/cmdb/hosts", get(list_hosts).post(create_host))
        .route("/api/cmdb/hosts/check", post(check_hosts))
        .route("/api/cmdb/hosts/{instance_id}", delete(delete_host))
}

/// POST /api/cmdb/hosts
/// Body: { "instance_id": "i-1", "hostname": "web-1", "address": "10.0.0.5", "port": 22 }
async fn create_host(
    State(state): State<AppState>,
    Json(input): Json<HostCreateInput>,
) -> Result<(StatusCode, Json<Host>), StatusCode> {
    if let Err(e) = input.validate() {
        tracing::warn!("Rejected host {}: {}", input.hostname, e);
        return Err(StatusCode::BAD_REQUEST);
    }

    if let Some(id) = input.instance_id.as_deref().filter(|id| !id.trim().is_empty()) {
        let filter = HostFilter { instance_id: Some(id.to_string()), status: None };
        match state.cmdb.list_hosts(&filter).await {
            Ok(existing) if !existing.is_empty() => return Err(StatusCode::CONFLICT),
            Ok(_) => {}
            Err(e) => {
                tracing::error!("Failed to look up host {}: {:#}", id, e);
                return Err(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
    }

    match state.cmdb.create_host(input).await {
        Ok(host) => Ok((StatusCode::CREATED, Json(host))),
        Err(e) => {
            tracing::error!("Failed to register host: {:#}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /api/cmdb/hosts?status=Failed
async fn list_hosts(
    State(state): State<AppState>,
    Query(filter): Query<HostFilter>,
) -> Result<Json<Vec<Host>>, StatusCode> {
    match state.cmdb.list_hosts(&filter).await {
        Ok(hosts) => Ok(Json(hosts)),
        Err(e) => {
            tracing::error!("Failed to list hosts: {:#}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// DELETE /api/cmdb/hosts/{instance_id}
async fn delete_host(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    match state.cmdb.delete_host(&instance_id).await {
        Ok(true) => Ok(Json(json!({ "message": "Host deleted successfully" }))),
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to delete host {}: {:#}", instance_id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Start one discovery sweep in the background
///
/// The sweep waits for queue space while checkers work through the backlog,
/// so the request only counts the inventory and returns.
///
/// POST /api/cmdb/hosts/check
/// Returns: 202 { "hosts": 3 }
async fn check_hosts(State(state): State<AppState>) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let hosts = match state.cmdb.list_hosts(&HostFilter::default()).await {
        Ok(hosts) => hosts.len(),
        Err(e) => {
            tracing::error!("Failed to load hosts for sweep: {:#}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let discovery = state.cmdb.discovery();
    tokio::spawn(async move {
        if let Err(e) = discovery.start_host_check().await {
            tracing::error!("❌ Manual host sweep failed: {:#}", e);
        }
    });

    Ok((StatusCode::ACCEPTED, Json(json!({ "hosts": hosts }))))
}
