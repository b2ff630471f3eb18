use crate::error::{Result, VaultError};
use crate::snapshot::{is_snapshot_filename, Snapshot};
use async_trait::async_trait;
use jiff::Timestamp;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Artifact management for snapshots.
///
/// The store knows nothing about the data file's semantics; it copies
/// bytes in and out of a dedicated directory and reports metadata. The
/// engine owns everything transactional (rollback, naming, retention).
#[async_trait]
pub trait SnapshotStore: Send + Sync + 'static {
    /// Lists all snapshots, sorted by creation time descending.
    async fn list(&self) -> Result<Vec<Snapshot>>;

    /// Copies the bytes at `source` into a new snapshot named `name`.
    async fn write(&self, source: &Path, name: &str) -> Result<Snapshot>;

    /// Removes the named snapshot. `NotFound` if it does not exist.
    async fn remove(&self, name: &str) -> Result<()>;

    /// Resolves the named snapshot's metadata. `NotFound` if absent.
    async fn resolve(&self, name: &str) -> Result<Snapshot>;

    /// Copies the named snapshot's bytes over `dest`.
    async fn restore_to(&self, name: &str, dest: &Path) -> Result<()>;

    /// Creates the snapshot directory if absent and probes that it is
    /// writable. Intended as a startup step; failure is fatal.
    async fn ensure_directory(&self) -> Result<()>;
}

/// Filesystem-backed snapshot store.
#[derive(Debug, Clone)]
pub struct FsSnapshotStore {
    dir: PathBuf,
}

impl FsSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory holding the snapshot artifacts.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolves `name` against the store directory, rejecting anything
    /// that is not a managed snapshot name.
    fn entry_path(&self, name: &str) -> Result<PathBuf> {
        if !is_snapshot_filename(name) {
            return Err(VaultError::NotFound(name.to_string()));
        }
        Ok(self.dir.join(name))
    }

    async fn snapshot_metadata(&self, name: &str, path: PathBuf) -> Result<Snapshot> {
        let metadata = tokio::fs::metadata(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                VaultError::NotFound(name.to_string())
            } else {
                VaultError::Storage(format!("failed to stat '{name}': {e}"))
            }
        })?;

        let modified = metadata.modified().map_err(|e| {
            VaultError::Storage(format!("failed to read modification time of '{name}': {e}"))
        })?;
        let created_at = Timestamp::try_from(modified).map_err(|e| {
            VaultError::Storage(format!("modification time of '{name}' is out of range: {e}"))
        })?;

        Ok(Snapshot {
            filename: name.to_string(),
            path,
            size: metadata.len(),
            created_at,
        })
    }
}

#[async_trait]
impl SnapshotStore for FsSnapshotStore {
    async fn list(&self) -> Result<Vec<Snapshot>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(|e| {
            VaultError::Storage(format!(
                "failed to read snapshot directory {}: {e}",
                self.dir.display()
            ))
        })?;

        let mut snapshots = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            VaultError::Storage(format!("failed to read snapshot directory entry: {e}"))
        })? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !is_snapshot_filename(&name) {
                // Rollback temp files and stray entries are not ours to report.
                continue;
            }
            snapshots.push(self.snapshot_metadata(&name, entry.path()).await?);
        }

        snapshots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(snapshots)
    }

    async fn write(&self, source: &Path, name: &str) -> Result<Snapshot> {
        if !is_snapshot_filename(name) {
            return Err(VaultError::Storage(format!(
                "'{name}' is not a valid snapshot name"
            )));
        }
        let dest = self.dir.join(name);

        // Snapshots are immutable; refuse to clobber an existing one.
        if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
            return Err(VaultError::Storage(format!(
                "snapshot '{name}' already exists"
            )));
        }

        if let Err(e) = tokio::fs::copy(source, &dest).await {
            // Clean up the partial artifact so a truncated copy never
            // masquerades as a valid snapshot.
            if let Err(cleanup) = tokio::fs::remove_file(&dest).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!(
                        filename = %name,
                        error = %cleanup,
                        "failed to remove partial snapshot after copy error"
                    );
                }
            }
            return Err(VaultError::Storage(format!(
                "failed to write snapshot '{name}': {e}"
            )));
        }

        self.snapshot_metadata(name, dest).await
    }

    async fn remove(&self, name: &str) -> Result<()> {
        let path = self.entry_path(name)?;

        tokio::fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                VaultError::NotFound(name.to_string())
            } else {
                VaultError::Storage(format!("failed to remove snapshot '{name}': {e}"))
            }
        })
    }

    async fn resolve(&self, name: &str) -> Result<Snapshot> {
        let path = self.entry_path(name)?;
        self.snapshot_metadata(name, path).await
    }

    async fn restore_to(&self, name: &str, dest: &Path) -> Result<()> {
        let path = self.entry_path(name)?;

        tokio::fs::copy(&path, dest).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                VaultError::NotFound(name.to_string())
            } else {
                VaultError::Storage(format!("failed to copy snapshot '{name}' out: {e}"))
            }
        })?;
        Ok(())
    }

    async fn ensure_directory(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            VaultError::Storage(format!(
                "failed to create snapshot directory {}: {e}",
                self.dir.display()
            ))
        })?;

        // Probe writability now rather than discovering it on the first
        // scheduled backup at 3am.
        let probe = self.dir.join(".write-probe");
        tokio::fs::write(&probe, b"probe").await.map_err(|e| {
            VaultError::Storage(format!(
                "snapshot directory {} is not writable: {e}",
                self.dir.display()
            ))
        })?;
        tokio::fs::remove_file(&probe).await.map_err(|e| {
            VaultError::Storage(format!(
                "failed to remove write probe in {}: {e}",
                self.dir.display()
            ))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> FsSnapshotStore {
        FsSnapshotStore::new(dir.path())
    }

    async fn seed_source(dir: &TempDir, content: &[u8]) -> PathBuf {
        let path = dir.path().join("source.db");
        tokio::fs::write(&path, content).await.unwrap();
        path
    }

    #[tokio::test]
    async fn write_then_list_and_resolve() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let source = seed_source(&dir, b"snapshot bytes").await;

        let written = store.write(&source, "backup-2026-08-07.db").await.unwrap();
        assert_eq!(written.filename, "backup-2026-08-07.db");
        assert_eq!(written.size, 14);

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0], written);

        let resolved = store.resolve("backup-2026-08-07.db").await.unwrap();
        assert_eq!(resolved, written);
    }

    #[tokio::test]
    async fn list_ignores_foreign_entries() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let source = seed_source(&dir, b"bytes").await;

        store.write(&source, "backup-2026-08-07.db").await.unwrap();
        tokio::fs::write(dir.path().join("waypoint.db.restore-tmp"), b"tmp")
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), b"hi")
            .await
            .unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn list_unreadable_directory_is_storage_error() {
        let store = FsSnapshotStore::new("/nonexistent/backups");

        let err = store.list().await.unwrap_err();
        assert!(matches!(err, VaultError::Storage(_)));
    }

    #[tokio::test]
    async fn write_refuses_existing_name() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let source = seed_source(&dir, b"bytes").await;

        store.write(&source, "backup-2026-08-07.db").await.unwrap();
        let err = store
            .write(&source, "backup-2026-08-07.db")
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::Storage(_)));
    }

    #[tokio::test]
    async fn write_missing_source_cleans_partial_file() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let err = store
            .write(Path::new("/nonexistent/source.db"), "backup-2026-08-07.db")
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::Storage(_)));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let err = store.remove("backup-2026-08-07.db").await.unwrap_err();
        assert!(matches!(err, VaultError::NotFound(_)));
    }

    #[tokio::test]
    async fn resolve_rejects_traversal_names() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let err = store.resolve("../../etc/passwd").await.unwrap_err();
        assert!(matches!(err, VaultError::NotFound(_)));
    }

    #[tokio::test]
    async fn restore_to_copies_bytes_out() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let source = seed_source(&dir, b"v1").await;

        store.write(&source, "backup-2026-08-07.db").await.unwrap();

        let dest = dir.path().join("restored.db");
        store
            .restore_to("backup-2026-08-07.db", &dest)
            .await
            .unwrap();
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"v1");
    }

    #[tokio::test]
    async fn ensure_directory_creates_nested_path() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b/backups");
        let store = FsSnapshotStore::new(&nested);

        store.ensure_directory().await.unwrap();
        assert!(nested.is_dir());
        // The probe file must not linger.
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ensure_directory_over_a_file_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        tokio::fs::write(&blocker, b"not a directory").await.unwrap();

        let store = FsSnapshotStore::new(blocker.join("backups"));
        let err = store.ensure_directory().await.unwrap_err();
        assert!(matches!(err, VaultError::Storage(_)));
    }
}
