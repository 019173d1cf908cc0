//! Job handoff primitives shared by the worker pool.
//!
//! - [`JobQueue`]: unbounded FIFO; `push` never blocks, `pop` hands each item
//!   to exactly one worker.
//! - [`PauseGate`]: broadcast Running/Paused flag consulted before every dequeue.
//!
//! Both live inside the background context; callers reach them only through
//! the manager's command channel.

mod gate;

pub use gate::{GateWatcher, PauseGate};

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

/// Unbounded multi-consumer FIFO.
///
/// Workers share the receiving half behind an async mutex, so at most one
/// worker waits inside `recv` at a time and every item is delivered once.
pub struct JobQueue<T> {
    tx: mpsc::UnboundedSender<T>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<T>>>,
}

impl<T> Clone for JobQueue<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<T> Default for JobQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> JobQueue<T> {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Append an item. Never blocks.
    pub fn push(&self, item: T) {
        // The receiver lives in `self`, so the channel cannot be closed here.
        if self.tx.send(item).is_err() {
            tracing::error!(target: "vidfetch.queue", "Job queue receiver dropped");
        }
    }

    /// Wait for the next item.
    ///
    /// Cancel-safe: dropping the future never loses an item.
    pub async fn pop(&self) -> Option<T> {
        let mut rx = self.rx.lock().await;
        rx.recv().await
    }

    /// Remove and return everything still queued, in FIFO order.
    pub async fn drain(&self) -> Vec<T> {
        let mut rx = self.rx.lock().await;
        let mut items = Vec::with_capacity(rx.len());
        while let Ok(item) = rx.try_recv() {
            items.push(item);
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = JobQueue::new();
        for n in 1..=3 {
            queue.push(n);
        }

        assert_eq!(queue.pop().await, Some(1));
        assert_eq!(queue.pop().await, Some(2));
        assert_eq!(queue.drain().await, vec![3]);
        assert!(queue.drain().await.is_empty());
    }

    #[tokio::test]
    async fn test_pop_waits_for_push() {
        let queue = JobQueue::new();
        let consumer = queue.clone();
        let handle = tokio::spawn(async move { consumer.pop().await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!handle.is_finished());

        queue.push("job");
        assert_eq!(handle.await.unwrap(), Some("job"));
    }

    #[tokio::test]
    async fn test_each_item_delivered_once() {
        let queue = JobQueue::new();
        let mut handles = Vec::new();
        for _ in 0..4 {
            let q = queue.clone();
            handles.push(tokio::spawn(async move {
                let mut got = Vec::new();
                while let Ok(Some(n)) =
                    tokio::time::timeout(Duration::from_millis(50), q.pop()).await
                {
                    got.push(n);
                }
                got
            }));
        }
        for n in 0..100 {
            queue.push(n);
        }

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }
        all.sort_unstable();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_cancelled_pop_loses_nothing() {
        let queue = JobQueue::new();
        let pending = tokio::time::timeout(Duration::from_millis(10), queue.pop()).await;
        assert!(pending.is_err());

        queue.push(7);
        assert_eq!(queue.pop().await, Some(7));
    }
}
