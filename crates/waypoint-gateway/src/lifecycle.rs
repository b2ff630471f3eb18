use std::sync::Arc;
use tracing::info;
use waypoint_vault::{
    BackupScheduler, FsBackupEngine, FsSnapshotStore, ScheduleSpec, SnapshotStore, SystemClock,
    VaultError,
};

/// Process-wide owner of the scheduler's running state.
///
/// Constructed once at boot and dropped at shutdown; no other component
/// starts or stops the scheduler. This replaces the ambient singleton
/// the dashboard previously reached for: whoever needs lifecycle
/// control gets handed this object explicitly.
pub struct Lifecycle {
    scheduler: BackupScheduler<FsSnapshotStore, SystemClock>,
}

impl Lifecycle {
    /// Prepares the snapshot directory, then starts the scheduled
    /// backup cycle when enabled.
    ///
    /// Directory setup runs even with the schedule disabled so that
    /// operator-triggered backups always have a writable store. A
    /// failure here is fatal for the process.
    pub async fn start(
        store: FsSnapshotStore,
        engine: Arc<FsBackupEngine>,
        enabled: bool,
        spec: ScheduleSpec,
    ) -> Result<Self, VaultError> {
        store.ensure_directory().await?;

        let mut scheduler = BackupScheduler::new(engine);
        if enabled {
            scheduler.start(spec);
            info!(spec = ?spec, "scheduled backups enabled");
        } else {
            info!("scheduled backups disabled");
        }

        Ok(Self { scheduler })
    }

    /// Stops the scheduler. Called on the shutdown signal, before the
    /// process exits.
    pub fn shutdown(mut self) {
        self.scheduler.stop();
        info!("backup scheduler shut down");
    }
}
