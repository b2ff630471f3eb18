use crate::clock::Clock;
use crate::engine::BackupEngine;
use crate::schedule::ScheduleSpec;
use crate::store::SnapshotStore;
use jiff::Timestamp;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Fires the backup-and-prune cycle on a recurrence, independent of
/// request traffic.
///
/// A fire whose work outlasts the recurrence interval does not pile up:
/// the in-progress flag makes an overlapping fire a skip, not a queue
/// entry. Failures inside a fire are logged and never stop the timer.
pub struct BackupScheduler<S: SnapshotStore, C: Clock + 'static> {
    engine: Arc<BackupEngine<S, C>>,
    in_progress: Arc<AtomicBool>,
    running: Option<RunningTimer>,
}

struct RunningTimer {
    shutdown: watch::Sender<bool>,
    _handle: JoinHandle<()>,
}

impl<S: SnapshotStore, C: Clock + 'static> BackupScheduler<S, C> {
    pub fn new(engine: Arc<BackupEngine<S, C>>) -> Self {
        Self {
            engine,
            in_progress: Arc::new(AtomicBool::new(false)),
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Starts the timer. If one is already running it is stopped first,
    /// so calling `start` again is an idempotent reconfigure.
    pub fn start(&mut self, spec: ScheduleSpec) {
        self.stop();

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let engine = Arc::clone(&self.engine);
        let in_progress = Arc::clone(&self.in_progress);

        let handle = tokio::spawn(async move {
            info!(spec = ?spec, "backup scheduler started");
            loop {
                let now = Timestamp::now();
                let next = spec.next_fire(now);
                let delay =
                    Duration::try_from(next.duration_since(now)).unwrap_or(Duration::ZERO);

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {
                        if in_progress.swap(true, Ordering::SeqCst) {
                            warn!("previous backup cycle still running; skipping this fire");
                            continue;
                        }
                        // The cycle runs detached so the timer keeps its
                        // cadence; the flag above is what prevents overlap.
                        let engine = Arc::clone(&engine);
                        let in_progress = Arc::clone(&in_progress);
                        tokio::spawn(async move {
                            run_cycle(engine.as_ref()).await;
                            in_progress.store(false, Ordering::SeqCst);
                        });
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("backup scheduler stopped");
        });

        self.running = Some(RunningTimer {
            shutdown,
            _handle: handle,
        });
    }

    /// Cancels the timer. No-op when not running. An in-flight cycle is
    /// not interrupted; it runs to completion or failure.
    pub fn stop(&mut self) {
        if let Some(timer) = self.running.take() {
            let _ = timer.shutdown.send(true);
        }
    }
}

impl<S: SnapshotStore, C: Clock + 'static> Drop for BackupScheduler<S, C> {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_cycle<S: SnapshotStore, C: Clock>(engine: &BackupEngine<S, C>) {
    match engine.create_backup().await {
        Ok(snapshot) => {
            info!(filename = %snapshot.filename, "scheduled backup complete");
            match engine.clean_old_backups().await {
                Ok(report) if report.deleted > 0 => {
                    info!(deleted = report.deleted, "scheduled retention prune complete");
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "scheduled retention prune failed"),
            }
        }
        Err(e) => error!(error = %e, "scheduled backup failed"),
    }
}
