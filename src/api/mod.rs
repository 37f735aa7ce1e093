/// HTTP API Layer
///
/// REST endpoints over the two services:
/// - Workflow save/delete/find/list (cluster resources plus the stored record)
/// - CMDB host inventory and on-demand reachability sweeps

use crate::{cmdb::CmdbService, workflow::WorkflowService};
use std::sync::Arc;

// Workflow endpoints (POST/GET/DELETE)
pub mod workflows;

// CMDB host endpoints
pub mod hosts;

pub use hosts::create_host_routes;
pub use workflows::create_workflow_routes;

/// Shared state for every API route
#[derive(Clone)]
pub struct AppState {
    pub workflows: WorkflowService,
    pub cmdb: Arc<CmdbService>,
}
