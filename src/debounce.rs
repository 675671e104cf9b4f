// src/debounce.rs

//! Debounced task runner, gated on a readiness condition.
//!
//! Rapid repeated `call()`s collapse into one execution of the wrapped task,
//! run after a quiet period with no further calls. If the readiness channel
//! still reads `false` when the quiet period elapses, the task waits for it
//! to flip to `true` instead of running early or being dropped; calls that
//! arrive while it is waiting coalesce into that same execution.
//!
//! At most one execution is pending at any time.

use std::future::Future;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tracing::debug;

/// Handle for poking a debounced task. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Debouncer {
    tx: mpsc::Sender<()>,
}

impl Debouncer {
    /// Spawn the background loop driving `task` and return a handle to it.
    ///
    /// `ready_rx` is the readiness condition: the task only ever runs while
    /// it reads `true`. The sender side is resolved exactly once, by proxy
    /// startup. Dropping all `Debouncer` clones stops the loop.
    pub fn spawn<F, Fut>(quiet_period: Duration, ready_rx: watch::Receiver<bool>, task: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        // Small buffer: a full channel means an execution is already pending,
        // so further pokes can be dropped without losing anything.
        let (tx, rx) = mpsc::channel::<()>(8);
        tokio::spawn(run_loop(quiet_period, ready_rx, rx, task));
        Self { tx }
    }

    /// Request an eventual execution of the wrapped task.
    ///
    /// Fire-and-forget; never blocks the caller.
    pub fn call(&self) {
        let _ = self.tx.try_send(());
    }
}

async fn run_loop<F, Fut>(
    quiet_period: Duration,
    mut ready_rx: watch::Receiver<bool>,
    mut rx: mpsc::Receiver<()>,
    mut task: F,
) where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    while rx.recv().await.is_some() {
        // Quiet period: each further poke restarts the countdown.
        loop {
            match timeout(quiet_period, rx.recv()).await {
                Ok(Some(())) => continue,
                Ok(None) => return,
                Err(_) => break,
            }
        }

        // Defer until the readiness condition holds. Closed sender means the
        // owning coordinator is gone and the task will never be runnable.
        if !*ready_rx.borrow() {
            debug!("debounced task not ready yet; waiting");
            if ready_rx.wait_for(|ready| *ready).await.is_err() {
                return;
            }
        }

        // Pokes that arrived while waiting are satisfied by this execution.
        while rx.try_recv().is_ok() {}

        task().await;
    }
}
