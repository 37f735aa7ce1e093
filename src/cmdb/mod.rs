/// CMDB Layer
///
/// Host inventory and background reachability reconciliation:
/// - Host types and SQLite persistence
/// - Discovery producer feeding `AddHost` events into the queue
/// - Telnet-style TCP connect checker writing status back
/// - CmdbService wiring it all together

// Host, HostStatus and request types
pub mod types;

// SQLite persistence layer for hosts
pub mod storage;

// One-shot inventory sweep into the event queue
pub mod discovery;

// TCP connect probe checker
pub mod telnet;

// Composition context owning the queue and checker factory
pub mod service;

pub use discovery::HostDiscovery;
pub use service::CmdbService;
pub use storage::{HostStore, SqliteHostStore};
pub use telnet::TelnetChecker;
pub use types::{Host, HostStatus};
