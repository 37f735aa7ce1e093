/// Host discovery producer
///
/// One sweep loads the whole inventory and queues an `AddHost` event per host.
/// Repeating the sweep is the caller's job (see `runtime::scheduler`).

use crate::cmdb::storage::HostStore;
use crate::cmdb::types::HostFilter;
use crate::runtime::queue::{Event, EventQueue};
use anyhow::Result;
use std::sync::Arc;

#[derive(Clone)]
pub struct HostDiscovery {
    store: Arc<dyn HostStore>,
    queue: Arc<EventQueue>,
}

impl HostDiscovery {
    pub fn new(store: Arc<dyn HostStore>, queue: Arc<EventQueue>) -> Self {
        Self { store, queue }
    }

    /// Queue every stored host for a probe and return how many were queued.
    ///
    /// Stops early, without error, as soon as the queue is closed. A failed
    /// inventory load aborts the sweep with the storage error.
    pub async fn start_host_check(&self) -> Result<usize> {
        let hosts = self.store.find_hosts(&HostFilter::default()).await?;
        tracing::debug!("🔍 Host sweep loaded {} host(s)", hosts.len());

        let mut pushed = 0;
        for host in hosts {
            if self.queue.is_closed() {
                tracing::info!("📪 Queue closed, host sweep stopped after {} host(s)", pushed);
                return Ok(pushed);
            }
            self.queue.push(Event::AddHost(host)).await;
            pushed += 1;
        }

        tracing::info!("📤 Host sweep queued {} host(s)", pushed);
        Ok(pushed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmdb::storage::SqliteHostStore;
    use crate::cmdb::types::{Host, HostStatus};
    use crate::database::DatabaseManager;
    use async_trait::async_trait;

    struct BrokenStore;

    #[async_trait]
    impl HostStore for BrokenStore {
        async fn find_hosts(&self, _filter: &HostFilter) -> Result<Vec<Host>> {
            anyhow::bail!("database is locked")
        }

        async fn update_host_status(&self, _instance_id: &str, _status: HostStatus) -> Result<()> {
            Ok(())
        }

        async fn create_host(&self, _host: &Host) -> Result<()> {
            Ok(())
        }

        async fn delete_host(&self, _instance_id: &str) -> Result<bool> {
            Ok(false)
        }
    }

    async fn store_with(ids: &[&str]) -> Arc<SqliteHostStore> {
        let db = DatabaseManager::in_memory().await.unwrap();
        let store = SqliteHostStore::new(db.pool());
        for id in ids {
            store
                .create_host(&Host {
                    instance_id: id.to_string(),
                    hostname: id.to_string(),
                    address: "10.0.0.1".to_string(),
                    port: 22,
                    status: HostStatus::Unchecked,
                    checked_at: None,
                })
                .await
                .unwrap();
        }
        Arc::new(store)
    }

    #[tokio::test]
    async fn empty_inventory_pushes_nothing() {
        let queue = Arc::new(EventQueue::new(8));
        let discovery = HostDiscovery::new(store_with(&[]).await, Arc::clone(&queue));

        assert_eq!(discovery.start_host_check().await.unwrap(), 0);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn every_host_becomes_an_add_host_event() {
        let queue = Arc::new(EventQueue::new(8));
        let discovery = HostDiscovery::new(store_with(&["i-1", "i-2", "i-3"]).await, Arc::clone(&queue));

        assert_eq!(discovery.start_host_check().await.unwrap(), 3);
        queue.close();

        let mut ids = Vec::new();
        while let Some(Event::AddHost(host)) = queue.pop().await {
            ids.push(host.instance_id);
        }
        assert_eq!(ids, vec!["i-1", "i-2", "i-3"]);
    }

    #[tokio::test]
    async fn closed_queue_stops_the_sweep() {
        let queue = Arc::new(EventQueue::new(8));
        queue.close();
        let discovery = HostDiscovery::new(store_with(&["i-1", "i-2"]).await, Arc::clone(&queue));

        assert_eq!(discovery.start_host_check().await.unwrap(), 0);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn storage_failure_aborts_the_sweep() {
        let queue = Arc::new(EventQueue::new(8));
        let discovery = HostDiscovery::new(Arc::new(BrokenStore), Arc::clone(&queue));

        let err = discovery.start_host_check().await.unwrap_err();
        assert!(err.to_string().contains("database is locked"));
        assert!(queue.is_empty());
    }
}
