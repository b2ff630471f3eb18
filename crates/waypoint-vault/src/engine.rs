use crate::clock::{Clock, SystemClock};
use crate::error::{Result, VaultError};
use crate::gate::ServiceGate;
use crate::snapshot::{snapshot_name_for, Snapshot};
use crate::store::{FsSnapshotStore, SnapshotStore};
use jiff::tz::TimeZone;
use jiff::SignedDuration;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use typed_builder::TypedBuilder;

/// Configures a backup engine instance.
#[derive(Debug, Clone, TypedBuilder)]
pub struct VaultSettings {
    /// Path of the live data file the engine protects.
    #[builder(setter(into))]
    pub data_path: PathBuf,
    /// Snapshots older than this many days are removed by
    /// [`BackupEngine::clean_old_backups`].
    pub retention_days: u32,
}

/// Listing of all snapshots with aggregate totals.
#[derive(Debug, Clone, Serialize)]
pub struct BackupList {
    pub backups: Vec<Snapshot>,
    pub total: usize,
    /// Sum of the individual snapshot sizes, in bytes.
    pub total_size: u64,
}

/// Result of a successful restore.
#[derive(Debug, Clone, Serialize)]
pub struct RestoreOutcome {
    pub success: bool,
    pub message: String,
}

/// Result of a retention-prune pass.
#[derive(Debug, Clone, Serialize)]
pub struct PruneReport {
    pub deleted: usize,
}

/// The engine wired to the real filesystem store and system clock.
pub type FsBackupEngine = BackupEngine<FsSnapshotStore, SystemClock>;

/// Orchestrates create/list/restore/delete/prune against the snapshot
/// store and the live data file.
///
/// Restore is all-or-nothing from the caller's view: a rollback copy of
/// the data file is taken before the overwrite, and a failed overwrite
/// puts it back. Per invocation the restore moves through
/// `CopyingRollback -> Overwriting -> {Committed | RollingBack ->
/// {RolledBack | Corrupt}}`; `RolledBack` still reports failure to the
/// caller, and `Corrupt` means the copy-back itself failed and the data
/// file content is unknown.
///
/// Concurrent restores are serialized against each other; the
/// [`ServiceGate`] is engaged for the whole restore window so the
/// serving layer can refuse traffic that would race the overwrite.
pub struct BackupEngine<S: SnapshotStore, C: Clock> {
    store: S,
    clock: C,
    settings: VaultSettings,
    gate: ServiceGate,
    restore_lock: Mutex<()>,
}

impl<S: SnapshotStore> BackupEngine<S, SystemClock> {
    /// Creates an engine backed by the real system clock.
    pub fn new(store: S, settings: VaultSettings) -> Self {
        Self::with_clock(store, settings, SystemClock)
    }
}

impl<S: SnapshotStore, C: Clock> BackupEngine<S, C> {
    pub fn with_clock(store: S, settings: VaultSettings, clock: C) -> Self {
        Self {
            store,
            clock,
            settings,
            gate: ServiceGate::new(),
            restore_lock: Mutex::new(()),
        }
    }

    /// The maintenance gate this engine raises during restores.
    ///
    /// Clones share state; hand one to the serving layer.
    pub fn gate(&self) -> ServiceGate {
        self.gate.clone()
    }

    /// Snapshots the data file into the store.
    ///
    /// The snapshot name carries the current date; a second backup on
    /// the same day gets a version suffix. No internal retry: a failed
    /// copy surfaces to the caller.
    pub async fn create_backup(&self) -> Result<Snapshot> {
        let data_path = &self.settings.data_path;
        self.check_data_file().await?;

        let existing: Vec<String> = self
            .store
            .list()
            .await?
            .into_iter()
            .map(|s| s.filename)
            .collect();
        let date = self.clock.now().to_zoned(TimeZone::UTC).date();
        let name = snapshot_name_for(date, &existing);

        let snapshot = self.store.write(data_path, &name).await?;
        info!(
            filename = %snapshot.filename,
            size = snapshot.size,
            "backup created"
        );
        Ok(snapshot)
    }

    /// Lists all snapshots, newest first, with aggregate totals.
    pub async fn backup_list(&self) -> Result<BackupList> {
        let backups = self.store.list().await?;
        let total = backups.len();
        let total_size = backups.iter().map(|s| s.size).sum();

        Ok(BackupList {
            backups,
            total,
            total_size,
        })
    }

    /// Restores the named snapshot over the data file.
    ///
    /// On success the caller must restart the serving process: it holds
    /// pooled connections against the old file content.
    pub async fn restore_backup(&self, filename: &str) -> Result<RestoreOutcome> {
        // At most one restore in flight.
        let _guard = self.restore_lock.lock().await;

        let snapshot = self.store.resolve(filename).await?;
        let data_path = self.settings.data_path.clone();
        self.check_data_file().await?;

        let rollback = rollback_path(&data_path);
        self.gate.engage();

        // CopyingRollback: must complete before any destructive step.
        if let Err(e) = tokio::fs::copy(&data_path, &rollback).await {
            self.gate.release();
            return Err(VaultError::Backup(format!(
                "failed to copy data file to rollback path {}: {e}",
                rollback.display()
            )));
        }

        // Overwriting.
        match self.store.restore_to(filename, &data_path).await {
            Ok(()) => {
                // Committed.
                if let Err(e) = tokio::fs::remove_file(&rollback).await {
                    warn!(
                        path = %rollback.display(),
                        error = %e,
                        "failed to remove rollback file after successful restore"
                    );
                }
                self.gate.release();
                info!(filename = %snapshot.filename, "backup restored");
                Ok(RestoreOutcome {
                    success: true,
                    message: format!(
                        "backup '{filename}' restored; restart the service for the \
                         change to take effect"
                    ),
                })
            }
            Err(overwrite_err) => {
                // RollingBack: exactly one attempt, never retried.
                match tokio::fs::copy(&rollback, &data_path).await {
                    Ok(_) => {
                        // RolledBack.
                        if let Err(e) = tokio::fs::remove_file(&rollback).await {
                            warn!(
                                path = %rollback.display(),
                                error = %e,
                                "failed to remove rollback file after rollback"
                            );
                        }
                        self.gate.release();
                        error!(
                            filename = %filename,
                            error = %overwrite_err,
                            "restore failed; data file rolled back"
                        );
                        Err(VaultError::Backup(format!(
                            "restore of '{filename}' failed and the data file was \
                             rolled back: {overwrite_err}"
                        )))
                    }
                    Err(rollback_err) => {
                        // Corrupt: the gate stays engaged until an
                        // operator intervenes.
                        error!(
                            filename = %filename,
                            overwrite_error = %overwrite_err,
                            rollback_error = %rollback_err,
                            "restore failed and rollback copy-back failed"
                        );
                        Err(VaultError::CorruptState(format!(
                            "restore of '{filename}' failed ({overwrite_err}) and \
                             rolling back from {} also failed ({rollback_err})",
                            rollback.display()
                        )))
                    }
                }
            }
        }
    }

    /// Deletes the named snapshot. `NotFound` if it does not exist.
    pub async fn delete_backup(&self, filename: &str) -> Result<()> {
        self.store.remove(filename).await?;
        info!(filename = %filename, "backup deleted");
        Ok(())
    }

    /// Resolves the named snapshot's path for byte-stream transfer by
    /// the caller. Performs no copy.
    pub async fn download_backup(&self, filename: &str) -> Result<PathBuf> {
        let snapshot = self.store.resolve(filename).await?;
        Ok(snapshot.path)
    }

    /// Removes every snapshot strictly older than the retention
    /// threshold. A single failed deletion is logged and does not abort
    /// the pass.
    pub async fn clean_old_backups(&self) -> Result<PruneReport> {
        let snapshots = self.store.list().await?;
        let now = self.clock.now();
        let retention = SignedDuration::from_hours(i64::from(self.settings.retention_days) * 24);

        let mut deleted = 0;
        for snapshot in snapshots {
            let age = now.duration_since(snapshot.created_at);
            if age <= retention {
                continue;
            }
            match self.store.remove(&snapshot.filename).await {
                Ok(()) => {
                    deleted += 1;
                    info!(filename = %snapshot.filename, "expired backup deleted");
                }
                Err(e) => {
                    warn!(
                        filename = %snapshot.filename,
                        error = %e,
                        "failed to delete expired backup"
                    );
                }
            }
        }

        Ok(PruneReport { deleted })
    }

    async fn check_data_file(&self) -> Result<()> {
        let data_path = &self.settings.data_path;
        let metadata = tokio::fs::metadata(data_path).await.map_err(|e| {
            VaultError::Backup(format!(
                "data file {} is not readable: {e}",
                data_path.display()
            ))
        })?;
        if !metadata.is_file() {
            return Err(VaultError::Backup(format!(
                "data file {} is not a regular file",
                data_path.display()
            )));
        }
        Ok(())
    }
}

/// Same-directory temporary rollback path for the data file.
fn rollback_path(data_path: &Path) -> PathBuf {
    let mut os = data_path.as_os_str().to_owned();
    os.push(".restore-tmp");
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::test_clock::TestClock;
    use async_trait::async_trait;
    use jiff::Timestamp;
    use std::time::SystemTime;
    use tempfile::TempDir;

    const NOON: &str = "2026-08-07T12:00:00Z";

    struct Fixture {
        _dir: TempDir,
        data_path: PathBuf,
        store_dir: PathBuf,
    }

    async fn fixture(data: &[u8]) -> Fixture {
        let dir = TempDir::new().unwrap();
        let data_path = dir.path().join("waypoint.db");
        tokio::fs::write(&data_path, data).await.unwrap();
        let store_dir = dir.path().join("backups");
        tokio::fs::create_dir(&store_dir).await.unwrap();
        Fixture {
            data_path,
            store_dir,
            _dir: dir,
        }
    }

    fn engine_at(
        fx: &Fixture,
        now: &str,
        retention_days: u32,
    ) -> BackupEngine<FsSnapshotStore, TestClock> {
        let settings = VaultSettings::builder()
            .data_path(&fx.data_path)
            .retention_days(retention_days)
            .build();
        BackupEngine::with_clock(
            FsSnapshotStore::new(&fx.store_dir),
            settings,
            TestClock::new(now.parse().unwrap()),
        )
    }

    fn set_created_at(path: &Path, at: Timestamp) {
        let file = std::fs::OpenOptions::new()
            .write(true)
            .open(path)
            .unwrap();
        file.set_modified(SystemTime::from(at)).unwrap();
    }

    /// Delegating store that injects failures at chosen seams.
    struct SabotageStore {
        inner: FsSnapshotStore,
        fail_overwrite: bool,
        delete_on_overwrite: Option<PathBuf>,
        fail_remove_of: Option<String>,
    }

    impl SabotageStore {
        fn new(inner: FsSnapshotStore) -> Self {
            Self {
                inner,
                fail_overwrite: false,
                delete_on_overwrite: None,
                fail_remove_of: None,
            }
        }
    }

    #[async_trait]
    impl SnapshotStore for SabotageStore {
        async fn list(&self) -> Result<Vec<Snapshot>> {
            self.inner.list().await
        }

        async fn write(&self, source: &Path, name: &str) -> Result<Snapshot> {
            self.inner.write(source, name).await
        }

        async fn remove(&self, name: &str) -> Result<()> {
            if self.fail_remove_of.as_deref() == Some(name) {
                return Err(VaultError::Storage("injected remove failure".to_string()));
            }
            self.inner.remove(name).await
        }

        async fn resolve(&self, name: &str) -> Result<Snapshot> {
            self.inner.resolve(name).await
        }

        async fn restore_to(&self, name: &str, dest: &Path) -> Result<()> {
            if self.fail_overwrite {
                // Leave a half-written data file behind, as a torn copy
                // would.
                tokio::fs::write(dest, b"torn write").await.unwrap();
                if let Some(rollback) = &self.delete_on_overwrite {
                    let _ = tokio::fs::remove_file(rollback).await;
                }
                return Err(VaultError::Storage(
                    "injected overwrite failure".to_string(),
                ));
            }
            self.inner.restore_to(name, dest).await
        }

        async fn ensure_directory(&self) -> Result<()> {
            self.inner.ensure_directory().await
        }
    }

    fn sabotaged_engine(
        fx: &Fixture,
        configure: impl FnOnce(&mut SabotageStore),
    ) -> BackupEngine<SabotageStore, TestClock> {
        let mut store = SabotageStore::new(FsSnapshotStore::new(&fx.store_dir));
        configure(&mut store);
        let settings = VaultSettings::builder()
            .data_path(&fx.data_path)
            .retention_days(30)
            .build();
        BackupEngine::with_clock(store, settings, TestClock::new(NOON.parse().unwrap()))
    }

    #[tokio::test]
    async fn backup_content_equals_data_file_content() {
        let fx = fixture(b"v1").await;
        let engine = engine_at(&fx, NOON, 30);

        let snapshot = engine.create_backup().await.unwrap();
        assert_eq!(snapshot.filename, "backup-2026-08-07.db");
        assert_eq!(snapshot.size, 2);
        assert_eq!(tokio::fs::read(&snapshot.path).await.unwrap(), b"v1");
    }

    #[tokio::test]
    async fn create_backup_fails_closed_without_data_file() {
        let fx = fixture(b"v1").await;
        tokio::fs::remove_file(&fx.data_path).await.unwrap();
        let engine = engine_at(&fx, NOON, 30);

        let err = engine.create_backup().await.unwrap_err();
        assert!(matches!(err, VaultError::Backup(_)));
    }

    #[tokio::test]
    async fn same_day_backups_get_version_suffixes() {
        let fx = fixture(b"v1").await;
        let engine = engine_at(&fx, NOON, 30);

        let first = engine.create_backup().await.unwrap();
        tokio::fs::write(&fx.data_path, b"v2").await.unwrap();
        let second = engine.create_backup().await.unwrap();
        let third = engine.create_backup().await.unwrap();

        assert_eq!(first.filename, "backup-2026-08-07.db");
        assert_eq!(second.filename, "backup-2026-08-07.2.db");
        assert_eq!(third.filename, "backup-2026-08-07.3.db");
        // Each snapshot froze the bytes at its call time.
        assert_eq!(tokio::fs::read(&first.path).await.unwrap(), b"v1");
        assert_eq!(tokio::fs::read(&second.path).await.unwrap(), b"v2");
    }

    #[tokio::test]
    async fn backup_list_sums_sizes() {
        let fx = fixture(b"12345").await;
        let engine = engine_at(&fx, NOON, 30);

        let empty = engine.backup_list().await.unwrap();
        assert_eq!(empty.total, 0);
        assert_eq!(empty.total_size, 0);

        engine.create_backup().await.unwrap();
        tokio::fs::write(&fx.data_path, b"123").await.unwrap();
        engine.create_backup().await.unwrap();

        let list = engine.backup_list().await.unwrap();
        assert_eq!(list.total, 2);
        assert_eq!(list.total_size, 8);
        assert_eq!(
            list.total_size,
            list.backups.iter().map(|s| s.size).sum::<u64>()
        );
    }

    #[tokio::test]
    async fn restore_roundtrip() {
        let fx = fixture(b"v1").await;
        let engine = engine_at(&fx, NOON, 30);

        let snapshot = engine.create_backup().await.unwrap();
        tokio::fs::write(&fx.data_path, b"v2").await.unwrap();

        let outcome = engine.restore_backup(&snapshot.filename).await.unwrap();
        assert!(outcome.success);
        assert!(outcome.message.contains("restart"));
        assert_eq!(tokio::fs::read(&fx.data_path).await.unwrap(), b"v1");
        // The rollback temp file must not linger.
        assert!(!rollback_path(&fx.data_path).exists());
        assert!(!engine.gate().is_engaged());
    }

    #[tokio::test]
    async fn restore_missing_backup_is_not_found() {
        let fx = fixture(b"v1").await;
        let engine = engine_at(&fx, NOON, 30);

        let err = engine
            .restore_backup("backup-2026-01-01.db")
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::NotFound(_)));
    }

    #[tokio::test]
    async fn restore_fails_closed_without_data_file() {
        let fx = fixture(b"v1").await;
        let engine = engine_at(&fx, NOON, 30);
        let snapshot = engine.create_backup().await.unwrap();

        tokio::fs::remove_file(&fx.data_path).await.unwrap();

        let err = engine.restore_backup(&snapshot.filename).await.unwrap_err();
        assert!(matches!(err, VaultError::Backup(_)));
    }

    #[tokio::test]
    async fn failed_overwrite_rolls_back_the_data_file() {
        let fx = fixture(b"v1").await;
        let engine = sabotaged_engine(&fx, |s| s.fail_overwrite = true);

        let snapshot = engine.create_backup().await.unwrap();
        tokio::fs::write(&fx.data_path, b"pre-restore").await.unwrap();

        let err = engine.restore_backup(&snapshot.filename).await.unwrap_err();
        assert!(matches!(err, VaultError::Backup(_)));
        // Byte-identical to the state before the attempt.
        assert_eq!(
            tokio::fs::read(&fx.data_path).await.unwrap(),
            b"pre-restore"
        );
        assert!(!rollback_path(&fx.data_path).exists());
        assert!(!engine.gate().is_engaged());
    }

    #[tokio::test]
    async fn failed_rollback_is_corrupt_state_and_keeps_gate_engaged() {
        let fx = fixture(b"v1").await;
        let rollback = rollback_path(&fx.data_path);
        let engine = sabotaged_engine(&fx, |s| {
            s.fail_overwrite = true;
            s.delete_on_overwrite = Some(rollback);
        });

        let snapshot = engine.create_backup().await.unwrap();

        let err = engine.restore_backup(&snapshot.filename).await.unwrap_err();
        assert!(matches!(err, VaultError::CorruptState(_)));
        assert!(engine.gate().is_engaged());
    }

    #[tokio::test]
    async fn delete_backup_removes_the_snapshot() {
        let fx = fixture(b"v1").await;
        let engine = engine_at(&fx, NOON, 30);

        let snapshot = engine.create_backup().await.unwrap();
        engine.delete_backup(&snapshot.filename).await.unwrap();

        assert_eq!(engine.backup_list().await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn delete_missing_backup_is_not_found() {
        let fx = fixture(b"v1").await;
        let engine = engine_at(&fx, NOON, 30);

        let err = engine
            .delete_backup("backup-2026-01-01.db")
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::NotFound(_)));
    }

    #[tokio::test]
    async fn download_resolves_the_snapshot_path() {
        let fx = fixture(b"v1").await;
        let engine = engine_at(&fx, NOON, 30);

        let snapshot = engine.create_backup().await.unwrap();
        let path = engine.download_backup(&snapshot.filename).await.unwrap();
        assert_eq!(path, snapshot.path);

        let err = engine
            .download_backup("backup-2026-01-01.db")
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::NotFound(_)));
    }

    #[tokio::test]
    async fn prune_deletes_only_snapshots_older_than_retention() {
        let fx = fixture(b"v1").await;
        let engine = engine_at(&fx, NOON, 30);
        let now: Timestamp = NOON.parse().unwrap();

        let old = engine.create_backup().await.unwrap();
        set_created_at(&old.path, now - SignedDuration::from_hours(31 * 24));
        let young = engine.create_backup().await.unwrap();
        set_created_at(&young.path, now - SignedDuration::from_hours(10 * 24));

        let report = engine.clean_old_backups().await.unwrap();
        assert_eq!(report.deleted, 1);

        let remaining = engine.backup_list().await.unwrap();
        assert_eq!(remaining.total, 1);
        assert_eq!(remaining.backups[0].filename, young.filename);
    }

    #[tokio::test]
    async fn prune_keeps_snapshot_exactly_at_threshold() {
        let fx = fixture(b"v1").await;
        let engine = engine_at(&fx, NOON, 30);
        let now: Timestamp = NOON.parse().unwrap();

        let boundary = engine.create_backup().await.unwrap();
        set_created_at(&boundary.path, now - SignedDuration::from_hours(30 * 24));

        let report = engine.clean_old_backups().await.unwrap();
        assert_eq!(report.deleted, 0);
        assert_eq!(engine.backup_list().await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn prune_continues_past_a_failed_deletion() {
        let fx = fixture(b"v1").await;
        let now: Timestamp = NOON.parse().unwrap();

        // Two expired snapshots; removal of the first is sabotaged.
        let plain = engine_at(&fx, NOON, 30);
        let first = plain.create_backup().await.unwrap();
        let second = plain.create_backup().await.unwrap();
        set_created_at(&first.path, now - SignedDuration::from_hours(40 * 24));
        set_created_at(&second.path, now - SignedDuration::from_hours(40 * 24));

        let engine = sabotaged_engine(&fx, |s| {
            s.fail_remove_of = Some(first.filename.clone());
        });

        let report = engine.clean_old_backups().await.unwrap();
        assert_eq!(report.deleted, 1);

        let remaining = engine.backup_list().await.unwrap();
        assert_eq!(remaining.total, 1);
        assert_eq!(remaining.backups[0].filename, first.filename);
    }
}
