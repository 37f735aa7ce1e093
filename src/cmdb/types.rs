/// Host inventory type definitions

use serde::{Deserialize, Serialize};

/// Outcome of the most recent reachability probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostStatus {
    /// Never probed
    Unchecked,
    Success,
    Failed,
}

impl HostStatus {
    /// Integer code stored in the `status` column
    pub fn code(&self) -> i64 {
        match self {
            HostStatus::Unchecked => 0,
            HostStatus::Success => 1,
            HostStatus::Failed => 2,
        }
    }

    /// Unknown codes read back as Unchecked
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => HostStatus::Success,
            2 => HostStatus::Failed,
            _ => HostStatus::Unchecked,
        }
    }
}

/// An inventory host whose reachability is reconciled in the background
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    /// Opaque external identifier
    pub instance_id: String,
    pub hostname: String,
    /// IP address or DNS name probed by the checker
    pub address: String,
    /// TCP port probed by the checker (usually SSH)
    pub port: u16,
    pub status: HostStatus,
    /// RFC 3339 time of the last status write
    pub checked_at: Option<String>,
}

/// Request body for registering a host
#[derive(Debug, Clone, Deserialize)]
pub struct HostCreateInput {
    /// Generated when omitted
    #[serde(default)]
    pub instance_id: Option<String>,
    pub hostname: String,
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    22
}

impl HostCreateInput {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.address.trim().is_empty() {
            anyhow::bail!("host address is required");
        }
        if self.port == 0 {
            anyhow::bail!("host port must be non-zero");
        }
        Ok(())
    }

    pub fn into_host(self) -> Host {
        Host {
            instance_id: self
                .instance_id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            hostname: self.hostname,
            address: self.address,
            port: self.port,
            status: HostStatus::Unchecked,
            checked_at: None,
        }
    }
}

/// Filter for host lookups; the default matches every host
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostFilter {
    #[serde(default)]
    pub instance_id: Option<String>,
    #[serde(default)]
    pub status: Option<HostStatus>,
}
