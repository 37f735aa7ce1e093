/// SQLite persistence layer for workflow records
///
/// `WorkflowStore` is the storage contract the orchestrator depends on;
/// `SqliteWorkflowStore` implements it on the shared sqlx pool.

use crate::workflow::types::{ServiceType, Workflow, WorkflowExists, WorkflowListInput};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::{sqlite::SqlitePool, sqlite::SqliteRow, Row};

/// Storage contract for workflow records
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Insert a new record and return its id
    async fn save_workflow(&self, workflow: &Workflow) -> Result<i64>;

    async fn find_workflow(&self, id: i64) -> Result<Option<Workflow>>;

    async fn find_workflow_by_name(&self, name: &str, namespace: &str) -> Result<Option<Workflow>>;

    /// Returns false when no record had this id
    async fn delete_workflow(&self, id: i64) -> Result<bool>;

    /// One page of workflows matching the name filter, plus the total match count
    async fn page_workflows(&self, filter: &WorkflowListInput) -> Result<(Vec<Workflow>, i64)>;
}

/// SQLite-based workflow storage
#[derive(Debug, Clone)]
pub struct SqliteWorkflowStore {
    pool: SqlitePool,
}

impl SqliteWorkflowStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn workflow_from_row(row: &SqliteRow) -> Result<Workflow> {
    let service_type: String = row.try_get("service_type")?;
    Ok(Workflow {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        namespace: row.try_get("namespace")?,
        replicas: row.try_get("replicas")?,
        service_type: service_type.parse::<ServiceType>()?,
    })
}

#[async_trait]
impl WorkflowStore for SqliteWorkflowStore {
    async fn save_workflow(&self, workflow: &Workflow) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO workflows (name, namespace, replicas, service_type, updated_at)
            VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP)
            "#,
        )
        .bind(&workflow.name)
        .bind(&workflow.namespace)
        .bind(workflow.replicas)
        .bind(workflow.service_type.as_str())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.last_insert_rowid()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(WorkflowExists {
                name: workflow.name.clone(),
                namespace: workflow.namespace.clone(),
            }
            .into()),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_workflow(&self, id: i64) -> Result<Option<Workflow>> {
        let row = sqlx::query(
            "SELECT id, name, namespace, replicas, service_type FROM workflows WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(workflow_from_row).transpose()
    }

    async fn find_workflow_by_name(&self, name: &str, namespace: &str) -> Result<Option<Workflow>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, namespace, replicas, service_type
            FROM workflows WHERE name = ? AND namespace = ?
            "#,
        )
        .bind(name)
        .bind(namespace)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(workflow_from_row).transpose()
    }

    async fn delete_workflow(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM workflows WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn page_workflows(&self, filter: &WorkflowListInput) -> Result<(Vec<Workflow>, i64)> {
        let pattern = format!("%{}%", filter.filter_name);
        let (offset, limit) = filter.offset_limit();

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workflows WHERE name LIKE ?")
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query(
            r#"
            SELECT id, name, namespace, replicas, service_type
            FROM workflows WHERE name LIKE ?
            ORDER BY id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let workflows = rows.iter().map(workflow_from_row).collect::<Result<Vec<_>>>()?;
        Ok((workflows, total))
    }
}
