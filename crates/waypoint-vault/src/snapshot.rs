use jiff::civil::Date;
use jiff::Timestamp;
use serde::Serialize;
use std::path::PathBuf;

pub(crate) const SNAPSHOT_PREFIX: &str = "backup-";
pub(crate) const SNAPSHOT_SUFFIX: &str = ".db";

/// An immutable point-in-time copy of the data file.
///
/// Snapshots are never mutated after creation; `created_at` comes from
/// the file's modification metadata, which is therefore the creation
/// instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub filename: String,
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    pub created_at: Timestamp,
}

/// Whether `name` is a snapshot artifact this store manages.
///
/// Anything else in the directory (rollback temp files, stray entries)
/// is ignored by listing and rejected by name-based lookups, which also
/// keeps path traversal out of operator-supplied filenames.
pub(crate) fn is_snapshot_filename(name: &str) -> bool {
    name.starts_with(SNAPSHOT_PREFIX)
        && name.ends_with(SNAPSHOT_SUFFIX)
        && name.len() > SNAPSHOT_PREFIX.len() + SNAPSHOT_SUFFIX.len()
        && !name.contains(['/', '\\'])
}

/// Picks the snapshot filename for a backup taken on `date`.
///
/// The base name carries day granularity (`backup-YYYY-MM-DD.db`). A
/// second backup on the same day gets a version suffix: `.2`, `.3`, and
/// so on, counted against the names already present in the store.
pub(crate) fn snapshot_name_for(date: Date, existing: &[String]) -> String {
    let base = format!("{SNAPSHOT_PREFIX}{date}{SNAPSHOT_SUFFIX}");
    if !existing.iter().any(|name| *name == base) {
        return base;
    }

    let mut version: u32 = 2;
    loop {
        let candidate = format!("{SNAPSHOT_PREFIX}{date}.{version}{SNAPSHOT_SUFFIX}");
        if !existing.iter().any(|name| *name == candidate) {
            return candidate;
        }
        version += 1;
    }
}
