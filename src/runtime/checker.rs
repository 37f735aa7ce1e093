/// Checker abstraction and the factory that runs checkers
///
/// A checker owns a control loop that pops events from its queue and hands
/// them to `check`. Errors from `check` go to `handle_error`; they never stop
/// the loop. The factory registers checkers by name and runs each registered
/// loop exactly once on its own task.

use crate::runtime::queue::{Event, EventQueue};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Pluggable reconciliation logic driven by queued events
#[async_trait]
pub trait Checker: Send + Sync + 'static {
    /// Registry identity; one checker per name
    fn name(&self) -> &str;

    /// The queue this checker consumes
    fn queue(&self) -> &Arc<EventQueue>;

    /// Evaluate one event
    async fn check(&self, event: Event) -> Result<()>;

    /// Sink for errors returned by `check`
    fn handle_error(&self, err: anyhow::Error) {
        tracing::error!("❌ Checker '{}' error: {:#}", self.name(), err);
    }

    /// Control loop: pop, check, repeat.
    ///
    /// Returns when the queue is closed and drained, or when `shutdown` is
    /// cancelled. Cancellation is observed only between events, so an event
    /// that was popped is always checked to completion.
    async fn run(&self, shutdown: CancellationToken) {
        tracing::info!("▶️ Checker '{}' started", self.name());
        loop {
            let event = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                event = self.queue().pop() => event,
            };
            let Some(event) = event else { break };

            tracing::debug!("📨 Checker '{}' received {} event", self.name(), event.kind());
            if let Err(err) = self.check(event).await {
                self.handle_error(err);
            }
        }
        tracing::info!("⏹️ Checker '{}' stopped", self.name());
    }
}

struct CheckerEntry {
    checker: Arc<dyn Checker>,
    running: bool,
}

/// Registry and launcher for every checker in the process
pub struct CheckerFactory {
    checkers: Mutex<HashMap<String, CheckerEntry>>,
    tasks: Mutex<JoinSet<()>>,
    shutdown: CancellationToken,
}

impl Default for CheckerFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckerFactory {
    pub fn new() -> Self {
        Self {
            checkers: Mutex::new(HashMap::new()),
            tasks: Mutex::new(JoinSet::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Register a checker under its name.
    ///
    /// If the name is already taken the existing instance is kept and returned.
    pub fn checker_for(&self, checker: Arc<dyn Checker>) -> Arc<dyn Checker> {
        let mut checkers = self.checkers.lock().unwrap_or_else(|p| p.into_inner());
        let entry = checkers.entry(checker.name().to_string()).or_insert_with(|| {
            tracing::info!("📝 Registered checker '{}'", checker.name());
            CheckerEntry { checker, running: false }
        });
        Arc::clone(&entry.checker)
    }

    /// Spawn the run loop of every registered checker that is not running yet.
    /// Returns without waiting for the loops; must be called inside a tokio runtime.
    pub fn start(&self) {
        let mut checkers = self.checkers.lock().unwrap_or_else(|p| p.into_inner());
        let mut tasks = self.tasks.lock().unwrap_or_else(|p| p.into_inner());

        for (name, entry) in checkers.iter_mut().filter(|(_, e)| !e.running) {
            let checker = Arc::clone(&entry.checker);
            let shutdown = self.shutdown.child_token();
            tasks.spawn(async move { checker.run(shutdown).await });
            entry.running = true;
            tracing::info!("🚀 Started checker '{}'", name);
        }
    }

    pub fn registered(&self) -> Vec<String> {
        let checkers = self.checkers.lock().unwrap_or_else(|p| p.into_inner());
        checkers.keys().cloned().collect()
    }

    pub fn is_running(&self, name: &str) -> bool {
        let checkers = self.checkers.lock().unwrap_or_else(|p| p.into_inner());
        checkers.get(name).map(|e| e.running).unwrap_or(false)
    }

    /// Number of run loops that have been spawned and not yet joined
    pub fn running_tasks(&self) -> usize {
        self.tasks.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    /// Cancel every run loop and wait for all of them to exit.
    ///
    /// Loops stop after their in-flight event; anything still queued stays
    /// in the queue. Use `drain` to process the backlog instead.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.join_all().await;
    }

    /// Wait for every run loop to exit on its own, without cancelling.
    ///
    /// The loops' queues must already be closed; each loop then checks the
    /// remaining events and returns once its queue is empty.
    pub async fn drain(&self) {
        self.join_all().await;
    }

    async fn join_all(&self) {
        let mut tasks = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(|p| p.into_inner()));

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!("❌ Checker task ended abnormally: {}", e);
            }
        }

        let mut checkers = self.checkers.lock().unwrap_or_else(|p| p.into_inner());
        for entry in checkers.values_mut() {
            entry.running = false;
        }
        tracing::info!("✅ All checkers stopped");
    }
}
