/// Configuration management for clusterdesk
///
/// Handles server binding, the SQLite data directory, the Kubernetes connection,
/// and tuning knobs for the host checker and workflow orchestration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Kubernetes resource API configuration
    pub kube: KubeConfig,
    /// Host reachability checker configuration
    pub checker: CheckerConfig,
    /// Workflow orchestration configuration
    pub workflow: WorkflowConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Directory holding clusterdesk.db (default: "data")
    pub data_dir: String,
}

/// Kubernetes connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KubeConfig {
    /// Connect to a cluster using the ambient kubeconfig / in-cluster credentials.
    /// When false, every resource call fails and only storage-backed reads work.
    pub enabled: bool,
}

/// Host checker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckerConfig {
    /// TCP connect timeout for a single probe, in milliseconds
    pub probe_timeout_ms: u64,
    /// Maximum number of queued events before producers wait
    pub queue_capacity: usize,
    /// Cron expression (with seconds) for the periodic host sweep
    pub sweep_schedule: String,
}

impl CheckerConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

/// Workflow orchestration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Compensate already-created resources when a later step fails.
    /// Off by default: failed steps leave earlier resources in place.
    pub rollback_on_failure: bool,
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for k8s/container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: env_or("CLUSTERDESK_HOST", "0.0.0.0"),
                port: env_parse("CLUSTERDESK_PORT", 3005),
            },
            database: DatabaseConfig {
                data_dir: env_or("CLUSTERDESK_DATA_DIR", "data"),
            },
            kube: KubeConfig {
                enabled: env_parse("CLUSTERDESK_KUBE_ENABLED", true),
            },
            checker: CheckerConfig {
                probe_timeout_ms: env_parse("CLUSTERDESK_PROBE_TIMEOUT_MS", 3000),
                queue_capacity: env_parse("CLUSTERDESK_QUEUE_CAPACITY", 1024),
                sweep_schedule: env_or("CLUSTERDESK_SWEEP_SCHEDULE", "0 */5 * * * *"),
            },
            workflow: WorkflowConfig {
                rollback_on_failure: env_parse("CLUSTERDESK_ROLLBACK_ON_FAILURE", false),
            },
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
