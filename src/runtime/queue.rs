/// Bounded, closable FIFO event queue
///
/// Connects event producers (host discovery) with checker loops. Safe for
/// concurrent push/pop/close from any number of tasks.

use crate::cmdb::types::Host;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

/// An event routed to the checkers
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A host found by discovery that needs a reachability probe
    AddHost(Host),
}

impl Event {
    /// Event type tag
    pub fn kind(&self) -> &'static str {
        match self {
            Event::AddHost(_) => "AddHost",
        }
    }
}

/// Closable FIFO with a fixed capacity.
///
/// `push` waits while the queue is full and returns immediately once the queue
/// is closed. `pop` drains remaining events after `close` and then reports
/// closure with `None`.
#[derive(Debug)]
pub struct EventQueue {
    events: Mutex<VecDeque<Event>>,
    capacity: usize,
    closed: AtomicBool,
    /// Signalled when an event is pushed or the queue closes
    readable: Notify,
    /// Signalled when an event is popped or the queue closes
    writable: Notify,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
            closed: AtomicBool::new(false),
            readable: Notify::new(),
            writable: Notify::new(),
        }
    }

    /// Enqueue an event. A no-op once the queue is closed.
    pub async fn push(&self, event: Event) {
        let mut event = Some(event);
        loop {
            let notified = self.writable.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_closed() {
                tracing::debug!("📪 Queue closed, dropping event");
                return;
            }

            {
                let mut events = self.lock();
                if events.len() < self.capacity {
                    if let Some(event) = event.take() {
                        events.push_back(event);
                    }
                    drop(events);
                    self.readable.notify_one();
                    return;
                }
            }

            notified.await;
        }
    }

    /// Wait for the next event; `None` once the queue is closed and drained
    pub async fn pop(&self) -> Option<Event> {
        loop {
            let notified = self.readable.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(event) = self.lock().pop_front() {
                self.writable.notify_one();
                return Some(event);
            }

            if self.is_closed() {
                return None;
            }

            notified.await;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close the queue and wake every waiting producer and consumer. Idempotent.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::info!("📪 Event queue closed");
        }
        self.readable.notify_waiters();
        self.writable.notify_waiters();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Event>> {
        // the guarded deque is never left half-updated, so a poisoned lock is still usable
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmdb::types::HostStatus;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;

    fn host(id: &str) -> Event {
        Event::AddHost(Host {
            instance_id: id.to_string(),
            hostname: id.to_string(),
            address: "127.0.0.1".to_string(),
            port: 22,
            status: HostStatus::Unchecked,
            checked_at: None,
        })
    }

    fn instance_id(event: &Event) -> String {
        match event {
            Event::AddHost(h) => h.instance_id.clone(),
        }
    }

    #[tokio::test]
    async fn fifo_order_survives_close() {
        let queue = EventQueue::new(8);
        queue.push(host("a")).await;
        queue.push(host("b")).await;
        queue.close();
        queue.push(host("c")).await;

        assert_eq!(queue.pop().await.map(|e| instance_id(&e)), Some("a".to_string()));
        assert_eq!(queue.pop().await.map(|e| instance_id(&e)), Some("b".to_string()));
        assert_eq!(queue.pop().await, None);
        assert_eq!(queue.pop().await, None);
    }

    #[tokio::test]
    async fn push_after_close_returns_immediately() {
        let queue = EventQueue::new(1);
        queue.close();
        queue.close();
        tokio::time::timeout(Duration::from_millis(100), queue.push(host("a")))
            .await
            .expect("push after close must not block");
        assert!(queue.is_empty());
        assert!(queue.is_closed());
    }

    #[tokio::test]
    async fn close_wakes_blocked_consumer() {
        let queue = Arc::new(EventQueue::new(4));
        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pop().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.close();

        let popped = tokio::time::timeout(Duration::from_secs(1), consumer).await.unwrap().unwrap();
        assert_eq!(popped, None);
    }

    #[tokio::test]
    async fn full_queue_blocks_producer_until_pop() {
        let queue = Arc::new(EventQueue::new(1));
        queue.push(host("a")).await;

        let producer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.push(host("b")).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!producer.is_finished());

        assert_eq!(queue.pop().await.map(|e| instance_id(&e)), Some("a".to_string()));
        tokio::time::timeout(Duration::from_secs(1), producer).await.unwrap().unwrap();
        assert_eq!(queue.pop().await.map(|e| instance_id(&e)), Some("b".to_string()));
    }

    #[tokio::test]
    async fn close_releases_blocked_producer() {
        let queue = Arc::new(EventQueue::new(1));
        queue.push(host("a")).await;

        let producer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.push(host("b")).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.close();

        tokio::time::timeout(Duration::from_secs(1), producer).await.unwrap().unwrap();
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_pushes_lose_nothing() {
        let queue = Arc::new(EventQueue::new(16));
        let mut producers = Vec::new();
        for p in 0..2 {
            let queue = Arc::clone(&queue);
            producers.push(tokio::spawn(async move {
                for i in 0..100 {
                    queue.push(host(&format!("host-{}-{}", p, i))).await;
                }
            }));
        }

        let mut seen = HashSet::new();
        while seen.len() < 200 {
            let event = tokio::time::timeout(Duration::from_secs(5), queue.pop())
                .await
                .unwrap()
                .unwrap();
            assert!(seen.insert(instance_id(&event)), "event popped twice");
        }
        for producer in producers {
            producer.await.unwrap();
        }
        assert!(!queue.is_closed());
        assert!(queue.is_empty());
    }

    #[test]
    fn event_kind_tag() {
        assert_eq!(host("a").kind(), "AddHost");
    }
}
