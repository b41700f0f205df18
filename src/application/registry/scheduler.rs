//! Debounced flush task.
//!
//! ```text
//! mark_modified --(first mark of a window)--> arm signal
//!                                                 |
//!                             sleep(debounce) <---+
//!                                    |
//!                                    v
//!                            save_modified()  --> re-arm if marks arrived
//!
//! interval(safety) ------------> save_modified()
//! ```
//!
//! The task holds only a weak reference to the registry, so dropping every
//! registry handle ends it even without an explicit shutdown.

use std::sync::Weak;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::Inner;

type Receivers = (mpsc::UnboundedReceiver<()>, watch::Receiver<bool>);

/// Owns the flush task and the channels used to drive it.
pub(super) struct FlushScheduler {
    arm_tx: mpsc::UnboundedSender<()>,
    shutdown_tx: watch::Sender<bool>,
    receivers: Mutex<Option<Receivers>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl FlushScheduler {
    pub(super) fn new() -> Self {
        let (arm_tx, arm_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            arm_tx,
            shutdown_tx,
            receivers: Mutex::new(Some((arm_rx, shutdown_rx))),
            worker: Mutex::new(None),
        }
    }

    /// Open a debounce window.
    pub(super) fn arm(&self) {
        // Only fails once the task has exited; the final save covers that.
        let _ = self.arm_tx.send(());
    }

    /// Spawn the task. Returns `false` if it was already started.
    pub(super) fn start(&self, inner: Weak<Inner>, debounce: Duration, safety: Duration) -> bool {
        let Some((arm_rx, shutdown_rx)) = self.receivers.lock().take() else {
            return false;
        };
        let handle = tokio::spawn(run(inner, arm_rx, shutdown_rx, debounce, safety));
        *self.worker.lock() = Some(handle);
        true
    }

    #[must_use]
    pub(super) fn is_running(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Signal the task and wait for it to exit.
    ///
    /// A flush already in progress completes first.
    pub(super) async fn stop(&self) {
        self.shutdown_tx.send_replace(true);
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Flush task ended abnormally");
            }
        }
    }
}

async fn run(
    inner: Weak<Inner>,
    mut arm_rx: mpsc::UnboundedReceiver<()>,
    mut shutdown_rx: watch::Receiver<bool>,
    debounce: Duration,
    safety: Duration,
) {
    let mut safety_tick = interval_at(Instant::now() + safety, safety);
    safety_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    debug!(
        debounce_ms = debounce.as_millis() as u64,
        safety_secs = safety.as_secs(),
        "Flush task started"
    );

    loop {
        tokio::select! {
            biased;

            _ = shutdown_rx.changed() => break,

            signal = arm_rx.recv() => {
                if signal.is_none() {
                    break;
                }
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    () = tokio::time::sleep(debounce) => {}
                }
                while arm_rx.try_recv().is_ok() {}

                let Some(inner) = inner.upgrade() else { break };
                inner.debounced_flush().await;
            }

            _ = safety_tick.tick() => {
                let Some(inner) = inner.upgrade() else { break };
                let written = inner.save_modified().await;
                if written > 0 {
                    info!(written, "Safety flush wrote pending factions");
                }
            }
        }
    }

    debug!("Flush task stopped");
}
