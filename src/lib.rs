/// clusterdesk: Kubernetes workflow orchestration and host reachability tracking
///
/// This library composes Deployments, Services and Ingresses into tracked
/// workflows, and keeps a CMDB host inventory's reachability status current
/// through a queue-driven checker engine.

// Core configuration and setup
pub mod config;

// SQLite connection pool and schema
pub mod database;

// Kubernetes resource specs and the resource API
pub mod cluster;

// Workflow management layer - types, storage, saga and orchestrator
pub mod workflow;

// Reconciliation runtime - event queue, checker factory, sweep scheduler
pub mod runtime;

// CMDB layer - host inventory, discovery and telnet checker
pub mod cmdb;

// HTTP API layer - REST endpoints for workflows and hosts
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use cmdb::{CmdbService, Host, HostStatus};
pub use server::start_server;
pub use workflow::{ServiceType, Workflow, WorkflowService};
