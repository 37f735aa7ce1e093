/// Telnet-style reachability checker
///
/// Probes a host with a plain TCP connect. A refused, timed-out or
/// unresolvable connect is a normal "failed" outcome, not an error.

use crate::cmdb::storage::HostStore;
use crate::cmdb::types::{Host, HostStatus};
use crate::runtime::checker::Checker;
use crate::runtime::queue::{Event, EventQueue};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

pub const TELNET_CHECKER: &str = "telnet";

pub struct TelnetChecker {
    store: Arc<dyn HostStore>,
    queue: Arc<EventQueue>,
    timeout: Duration,
}

impl TelnetChecker {
    pub fn new(store: Arc<dyn HostStore>, queue: Arc<EventQueue>, timeout: Duration) -> Self {
        Self { store, queue, timeout }
    }

    /// TCP connect bounded by the probe timeout
    async fn probe(&self, host: &Host) -> bool {
        let connect = TcpStream::connect((host.address.as_str(), host.port));
        match tokio::time::timeout(self.timeout, connect).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                tracing::debug!("🔌 Probe {}:{} refused: {}", host.address, host.port, e);
                false
            }
            Err(_) => {
                tracing::debug!("⏱️ Probe {}:{} timed out after {:?}", host.address, host.port, self.timeout);
                false
            }
        }
    }

    async fn on_success(&self, host: &Host) -> Result<()> {
        self.store
            .update_host_status(&host.instance_id, HostStatus::Success)
            .await
            .with_context(|| format!("Failed to mark host {} reachable", host.instance_id))
    }

    async fn on_failure(&self, host: &Host) -> Result<()> {
        self.store
            .update_host_status(&host.instance_id, HostStatus::Failed)
            .await
            .with_context(|| format!("Failed to mark host {} unreachable", host.instance_id))
    }
}

#[async_trait]
impl Checker for TelnetChecker {
    fn name(&self) -> &str {
        TELNET_CHECKER
    }

    fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }

    async fn check(&self, event: Event) -> Result<()> {
        match event {
            Event::AddHost(host) => {
                if self.probe(&host).await {
                    tracing::debug!("✅ Host {} ({}:{}) reachable", host.instance_id, host.address, host.port);
                    self.on_success(&host).await
                } else {
                    tracing::info!("🚫 Host {} ({}:{}) unreachable", host.instance_id, host.address, host.port);
                    self.on_failure(&host).await
                }
            }
        }
    }
}
