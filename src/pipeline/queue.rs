//! Unbounded FIFO with join semantics: every `get` hands out a [`DoneGuard`], and `join`
//! returns once every item ever put has had its guard dropped.

use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, watch};

/// Acknowledges one dequeued item when dropped, whether processing succeeded, failed, or panicked.
#[must_use = "dropping the guard acknowledges the item immediately"]
pub struct DoneGuard {
    unfinished: Arc<watch::Sender<usize>>,
}

impl Drop for DoneGuard {
    fn drop(&mut self) {
        self.unfinished.send_modify(|n| *n -= 1);
    }
}

pub struct WorkQueue<T> {
    tx: mpsc::UnboundedSender<T>,
    rx: Mutex<mpsc::UnboundedReceiver<T>>,
    unfinished: Arc<watch::Sender<usize>>,
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (unfinished, _) = watch::channel(0);
        Self {
            tx,
            rx: Mutex::new(rx),
            unfinished: Arc::new(unfinished),
        }
    }

    /// Enqueue without blocking.
    pub fn put(&self, item: T) {
        self.unfinished.send_modify(|n| *n += 1);
        // rx lives in self, so the channel cannot be closed here
        let _ = self.tx.send(item);
    }

    /// Wait for the next item. None only if the queue is being torn down.
    pub async fn get(&self) -> Option<(T, DoneGuard)> {
        let item = self.rx.lock().await.recv().await?;
        Some((
            item,
            DoneGuard {
                unfinished: Arc::clone(&self.unfinished),
            },
        ))
    }

    /// Items put but not yet acknowledged.
    pub fn unfinished(&self) -> usize {
        *self.unfinished.borrow()
    }

    /// Block until every item put so far has been acknowledged.
    pub async fn join(&self) {
        let mut rx = self.unfinished.subscribe();
        // the sender is owned by self, so wait_for cannot fail while we borrow it
        let _ = rx.wait_for(|&n| n == 0).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn fifo_order() {
        let q = WorkQueue::new();
        for i in 0..3 {
            q.put(i);
        }
        let mut seen = Vec::new();
        for _ in 0..3 {
            let (i, _done) = q.get().await.unwrap();
            seen.push(i);
        }
        assert_eq!(seen, vec![0, 1, 2]);
        q.join().await;
    }

    #[tokio::test]
    async fn join_waits_for_guards() {
        let q = Arc::new(WorkQueue::new());
        q.put("a");
        let (_, guard) = q.get().await.unwrap();
        assert_eq!(q.unfinished(), 1);

        let joined = tokio::time::timeout(Duration::from_millis(50), q.join()).await;
        assert!(joined.is_err(), "join returned with an item outstanding");

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), q.join())
            .await
            .expect("join after ack");
        assert_eq!(q.unfinished(), 0);
    }

    #[tokio::test]
    async fn join_on_empty_queue_returns() {
        let q: WorkQueue<u8> = WorkQueue::new();
        q.join().await;
    }
}
