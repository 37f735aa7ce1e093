/// CMDB service
///
/// Composition context for the reconciliation engine: owns the event queue
/// and the checker factory, wires discovery to the telnet checker, and fronts
/// the host inventory for the HTTP layer.

use crate::cmdb::discovery::HostDiscovery;
use crate::cmdb::storage::HostStore;
use crate::cmdb::telnet::TelnetChecker;
use crate::cmdb::types::{Host, HostCreateInput, HostFilter};
use crate::config::CheckerConfig;
use crate::runtime::checker::CheckerFactory;
use crate::runtime::queue::EventQueue;
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub struct CmdbService {
    store: Arc<dyn HostStore>,
    queue: Arc<EventQueue>,
    factory: Arc<CheckerFactory>,
    probe_timeout: Duration,
    started: AtomicBool,
}

impl CmdbService {
    pub fn new(store: Arc<dyn HostStore>, config: &CheckerConfig) -> Self {
        Self {
            store,
            queue: Arc::new(EventQueue::new(config.queue_capacity)),
            factory: Arc::new(CheckerFactory::new()),
            probe_timeout: config.probe_timeout(),
            started: AtomicBool::new(false),
        }
    }

    pub fn queue(&self) -> Arc<EventQueue> {
        Arc::clone(&self.queue)
    }

    pub fn factory(&self) -> Arc<CheckerFactory> {
        Arc::clone(&self.factory)
    }

    /// Producer feeding this service's queue
    pub fn discovery(&self) -> HostDiscovery {
        HostDiscovery::new(Arc::clone(&self.store), self.queue())
    }

    /// Register the telnet checker and start the engine.
    ///
    /// Only the first call does anything; returns whether this call started it.
    pub fn start_checker(&self) -> bool {
        if self.started.swap(true, Ordering::AcqRel) {
            tracing::debug!("⏭️ Host checker already started");
            return false;
        }

        let telnet = TelnetChecker::new(Arc::clone(&self.store), self.queue(), self.probe_timeout);
        self.factory.checker_for(Arc::new(telnet));
        self.factory.start();

        tracing::info!("✅ Host checker engine started (probe timeout {:?})", self.probe_timeout);
        true
    }

    /// Close the queue and wait for every checker loop to finish.
    ///
    /// Events already queued are still checked before the loops exit.
    pub async fn shutdown(&self) {
        tracing::info!("⏹️ Stopping host checker engine ({} event(s) left to check)", self.queue.len());
        self.queue.close();
        self.factory.drain().await;
    }

    pub async fn create_host(&self, input: HostCreateInput) -> Result<Host> {
        input.validate()?;
        let host = input.into_host();
        self.store.create_host(&host).await?;
        tracing::info!("🖥️ Registered host {} ({}:{})", host.instance_id, host.address, host.port);
        Ok(host)
    }

    pub async fn list_hosts(&self, filter: &HostFilter) -> Result<Vec<Host>> {
        self.store.find_hosts(filter).await
    }

    pub async fn delete_host(&self, instance_id: &str) -> Result<bool> {
        self.store.delete_host(instance_id).await
    }
}
