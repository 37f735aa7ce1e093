/// Reconciliation Runtime
///
/// This module provides the asynchronous machinery the host checker runs on:
/// - A bounded, closable FIFO event queue
/// - The Checker trait and the factory that runs checker loops
/// - A cron scheduler that re-runs host discovery

// Closable FIFO connecting producers to checkers
pub mod queue;

// Checker trait and CheckerFactory
pub mod checker;

// Periodic host sweep using tokio-cron-scheduler
pub mod scheduler;

// Re-export main types
pub use checker::{Checker, CheckerFactory};
pub use queue::{Event, EventQueue};
pub use scheduler::SweepScheduler;
