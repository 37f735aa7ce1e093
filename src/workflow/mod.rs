/// Workflow Management Layer
///
/// This module handles composite deployable units: a Deployment, a Service and
/// an optional Ingress tracked as one record. It provides:
/// - Type definitions (Workflow, ServiceType, create/list inputs)
/// - SQLite persistence with sqlx
/// - Saga execution of ordered resource steps
/// - The orchestrator exposing Save / Delete / Find / FindList

// Core workflow type definitions and derived resource names
pub mod types;

// SQLite persistence layer for workflow records
pub mod storage;

// Ordered resource steps with compensations
pub mod saga;

// Save / Delete / Find / FindList
pub mod orchestrator;

// Re-export commonly used types
pub use orchestrator::WorkflowService;
pub use storage::{SqliteWorkflowStore, WorkflowStore};
pub use types::{ServiceType, Workflow, WorkflowCreateInput, WorkflowListInput, WorkflowPage};
