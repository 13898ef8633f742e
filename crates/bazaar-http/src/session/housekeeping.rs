//! Periodic housekeeping — drives the pool's eviction sweep on a fixed
//! cadence, on its own task, independent of request traffic.

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use bazaar_core::SharedClock;

/// Anything housekeeping can sweep. The pool implements this; tests swap
/// in counting or failing sweepers.
pub trait Sweeper: Send + Sync {
    /// Run one sweep as of `now`, returning how many entries were removed.
    fn sweep(&self, now: SystemTime) -> anyhow::Result<usize>;
}

struct Running {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Schedules `sweeper.sweep(now)` every `period` once started.
///
/// Sweeps run back-to-back on one task and missed ticks are skipped, so
/// two sweeps never overlap no matter how long one takes. A failed sweep
/// is logged and the schedule continues.
pub struct HouseKeeping {
    period: Duration,
    sweeper: Arc<dyn Sweeper>,
    clock: SharedClock,
    running: Mutex<Option<Running>>,
}

impl HouseKeeping {
    pub fn new(sweeper: Arc<dyn Sweeper>, period: Duration, clock: SharedClock) -> Self {
        Self {
            period,
            sweeper,
            clock,
            running: Mutex::new(None),
        }
    }

    /// Begin the schedule. The first sweep happens one full period after
    /// this call. Calling `start` while already running is a no-op.
    pub fn start(&self) {
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        if running.is_some() {
            return;
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let sweeper = Arc::clone(&self.sweeper);
        let clock = Arc::clone(&self.clock);
        let period = self.period;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    // Checked first so a stop never loses to a due tick.
                    biased;
                    _ = stop_rx.changed() => {
                        tracing::debug!("housekeeping stopped");
                        return;
                    }
                    _ = ticker.tick() => {
                        match sweeper.sweep(clock.now()) {
                            Ok(0) => {}
                            Ok(removed) => tracing::debug!(removed, "expired sessions swept"),
                            Err(e) => tracing::warn!(error = %e, "sweep failed, schedule continues"),
                        }
                    }
                }
            }
        });

        *running = Some(Running { stop_tx, task });
    }

    /// Cancel future sweeps. A sweep already underway finishes; nothing is
    /// scheduled after this returns. Idempotent, callable from any thread.
    pub fn stop(&self) {
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(running) = running.take() {
            let _ = running.stop_tx.send(true);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}

impl Drop for HouseKeeping {
    fn drop(&mut self) {
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(running) = running.take() {
            let _ = running.stop_tx.send(true);
            running.task.abort();
        }
    }
}
