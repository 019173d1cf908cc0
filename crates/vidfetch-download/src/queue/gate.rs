//! Pause gate.

use tokio::sync::watch;

/// Broadcast Running/Paused condition.
///
/// Pausing only withholds the next dequeue; jobs already handed to a worker
/// are unaffected. Repeated `pause`/`resume` calls are no-ops.
pub struct PauseGate {
    tx: watch::Sender<bool>,
}

impl PauseGate {
    /// Create a gate in the given state.
    #[must_use]
    pub fn new(paused: bool) -> Self {
        let (tx, _) = watch::channel(paused);
        Self { tx }
    }

    /// Switch to Paused.
    pub fn pause(&self) -> bool {
        self.set(true)
    }

    /// Switch to Running.
    pub fn resume(&self) -> bool {
        self.set(false)
    }

    /// Current state.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        *self.tx.borrow()
    }

    /// A handle a worker waits on.
    #[must_use]
    pub fn watcher(&self) -> GateWatcher {
        GateWatcher {
            rx: self.tx.subscribe(),
        }
    }

    /// Returns whether the state changed. Watchers are only woken on change.
    fn set(&self, paused: bool) -> bool {
        self.tx.send_if_modified(|current| {
            let changed = *current != paused;
            *current = paused;
            changed
        })
    }
}

/// Per-worker view of a [`PauseGate`].
pub struct GateWatcher {
    rx: watch::Receiver<bool>,
}

impl GateWatcher {
    /// Resolve once the gate is Running (immediately if it already is).
    pub async fn running(&mut self) {
        // A dropped gate means shutdown; let the caller move on.
        let _ = self.rx.wait_for(|paused| !*paused).await;
    }

    /// Resolve once the gate is Paused (immediately if it already is).
    pub async fn paused(&mut self) {
        if self.rx.wait_for(|paused| *paused).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_idempotent_transitions() {
        let gate = PauseGate::new(false);
        assert!(gate.pause());
        assert!(!gate.pause());
        assert!(gate.is_paused());
        assert!(gate.resume());
        assert!(!gate.resume());
        assert!(!gate.is_paused());
    }

    #[tokio::test]
    async fn test_running_waits_for_resume() {
        let gate = PauseGate::new(true);
        let mut watcher = gate.watcher();

        let waiting = tokio::time::timeout(Duration::from_millis(20), watcher.running()).await;
        assert!(waiting.is_err());

        gate.resume();
        tokio::time::timeout(Duration::from_millis(100), watcher.running())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_paused_resolves_immediately_when_paused() {
        let gate = PauseGate::new(false);
        let mut watcher = gate.watcher();
        gate.pause();
        tokio::time::timeout(Duration::from_millis(100), watcher.paused())
            .await
            .unwrap();
    }
}
