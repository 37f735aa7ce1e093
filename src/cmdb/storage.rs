/// SQLite persistence layer for the host inventory

use crate::cmdb::types::{Host, HostFilter, HostStatus};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::{sqlite::SqlitePool, sqlite::SqliteRow, QueryBuilder, Row, Sqlite};

/// Storage contract for inventory hosts
#[async_trait]
pub trait HostStore: Send + Sync {
    async fn find_hosts(&self, filter: &HostFilter) -> Result<Vec<Host>>;

    /// Write the probe outcome for a single host, matched by instance id
    async fn update_host_status(&self, instance_id: &str, status: HostStatus) -> Result<()>;

    async fn create_host(&self, host: &Host) -> Result<()>;

    /// Returns false when no host had this instance id
    async fn delete_host(&self, instance_id: &str) -> Result<bool>;
}

/// SQLite-based host storage
#[derive(Debug, Clone)]
pub struct SqliteHostStore {
    pool: SqlitePool,
}

impl SqliteHostStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn host_from_row(row: &SqliteRow) -> Result<Host> {
    let port: i64 = row.try_get("port")?;
    let status: i64 = row.try_get("status")?;
    Ok(Host {
        instance_id: row.try_get("instance_id")?,
        hostname: row.try_get("hostname")?,
        address: row.try_get("address")?,
        port: u16::try_from(port)?,
        status: HostStatus::from_code(status),
        checked_at: row.try_get("checked_at")?,
    })
}

#[async_trait]
impl HostStore for SqliteHostStore {
    async fn find_hosts(&self, filter: &HostFilter) -> Result<Vec<Host>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT instance_id, hostname, address, port, status, checked_at FROM cmdb_hosts WHERE 1 = 1",
        );
        if let Some(instance_id) = &filter.instance_id {
            query.push(" AND instance_id = ").push_bind(instance_id.clone());
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.code());
        }
        query.push(" ORDER BY created_at, instance_id");

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(host_from_row).collect()
    }

    async fn update_host_status(&self, instance_id: &str, status: HostStatus) -> Result<()> {
        sqlx::query("UPDATE cmdb_hosts SET status = ?, checked_at = ? WHERE instance_id = ?")
            .bind(status.code())
            .bind(chrono::Utc::now().to_rfc3339())
            .bind(instance_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_host(&self, host: &Host) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cmdb_hosts (instance_id, hostname, address, port, status)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&host.instance_id)
        .bind(&host.hostname)
        .bind(&host.address)
        .bind(i64::from(host.port))
        .bind(host.status.code())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_host(&self, instance_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cmdb_hosts WHERE instance_id = ?")
            .bind(instance_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
