//! # Debounce Scheduler
//!
//! Trailing-edge debounce keyed by field path.
//!
//! Each scheduled path gets one Tokio task that sleeps for the delay and then
//! reports the path over a channel. Scheduling the same path again aborts the
//! previous task, so only the last edit inside the window fires. Every
//! schedule carries a generation number; a notification whose generation is
//! no longer current (it raced an abort) is discarded on receipt.
//!
//! The scheduler only says *which* paths are due. What happens to them
//! (validation, change events) is up to the owner.

use std::collections::HashMap;
use std::time::Duration;

use jsonedit_path::FieldPath;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Delay used when debouncing is on and no delay is configured
pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug)]
struct Fired {
    path: FieldPath,
    generation: u64,
}

#[derive(Debug)]
struct Pending {
    generation: u64,
    /// `None` when no runtime was available; the path then waits for a flush
    task: Option<JoinHandle<()>>,
}

impl Pending {
    fn abort(&self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: HashMap<FieldPath, Pending>,
    next_generation: u64,
    tx: mpsc::UnboundedSender<Fired>,
    rx: mpsc::UnboundedReceiver<Fired>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            delay,
            pending: HashMap::new(),
            next_generation: 0,
            tx,
            rx,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Change the delay; pending paths keep their current deadlines
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// Zero delay: callers should act synchronously instead of scheduling
    pub fn is_immediate(&self) -> bool {
        self.delay.is_zero()
    }

    /// (Re)start the window for `path`.
    ///
    /// Must be called from within a Tokio runtime for the timer to run.
    /// Outside one the path stays pending until flushed.
    pub fn schedule(&mut self, path: &FieldPath) {
        self.next_generation += 1;
        let generation = self.next_generation;

        if let Some(previous) = self.pending.remove(path) {
            previous.abort();
            debug!(path = %path, "Rescheduled pending update");
        }

        let task = match Handle::try_current() {
            Ok(runtime) => {
                let tx = self.tx.clone();
                let delay = self.delay;
                let fired = Fired {
                    path: path.clone(),
                    generation,
                };
                Some(runtime.spawn(async move {
                    tokio::time::sleep(delay).await;
                    // Receiver lives as long as the scheduler; a send error
                    // only means the scheduler is gone.
                    let _ = tx.send(fired);
                }))
            }
            Err(_) => {
                warn!(path = %path, "No async runtime, update waits for an explicit flush");
                None
            }
        };

        self.pending.insert(path.clone(), Pending { generation, task });
    }

    /// Drop the pending update for `path`, if any
    pub fn cancel(&mut self, path: &FieldPath) -> bool {
        match self.pending.remove(path) {
            Some(pending) => {
                pending.abort();
                debug!(path = %path, "Cancelled pending update");
                true
            }
            None => false,
        }
    }

    /// Drop every pending update
    pub fn cancel_all(&mut self) -> usize {
        let count = self.pending.len();
        for (_, pending) in self.pending.drain() {
            pending.abort();
        }
        while self.rx.try_recv().is_ok() {}
        if count > 0 {
            debug!(count, "Cancelled all pending updates");
        }
        count
    }

    pub fn is_pending(&self, path: &FieldPath) -> bool {
        self.pending.contains_key(path)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Accept a notification if it is still current
    fn accept(&mut self, fired: Fired) -> Option<FieldPath> {
        match self.pending.get(&fired.path) {
            Some(pending) if pending.generation == fired.generation => {
                self.pending.remove(&fired.path);
                Some(fired.path)
            }
            _ => {
                debug!(path = %fired.path, "Discarded stale timer notification");
                None
            }
        }
    }

    /// Paths whose window has already elapsed, without waiting
    pub fn take_due(&mut self) -> Vec<FieldPath> {
        let mut due = Vec::new();
        while let Ok(fired) = self.rx.try_recv() {
            if let Some(path) = self.accept(fired) {
                due.push(path);
            }
        }
        due
    }

    /// Wait for the next path whose window elapses.
    ///
    /// Returns `None` once no timer is running.
    pub async fn next_due(&mut self) -> Option<FieldPath> {
        loop {
            if let Ok(fired) = self.rx.try_recv() {
                if let Some(path) = self.accept(fired) {
                    return Some(path);
                }
                continue;
            }
            if !self.pending.values().any(|pending| pending.task.is_some()) {
                return None;
            }
            let fired = self.rx.recv().await?;
            if let Some(path) = self.accept(fired) {
                return Some(path);
            }
        }
    }

    /// Stop every timer and return all pending paths, oldest edit first
    pub fn flush(&mut self) -> Vec<FieldPath> {
        let mut pending: Vec<(FieldPath, Pending)> = self.pending.drain().collect();
        pending.sort_by_key(|(_, pending)| pending.generation);
        while self.rx.try_recv().is_ok() {}
        pending
            .into_iter()
            .map(|(path, pending)| {
                pending.abort();
                path
            })
            .collect()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        for pending in self.pending.values() {
            pending.abort();
        }
    }
}
