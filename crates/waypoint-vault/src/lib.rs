//! Backup and recovery subsystem for the Waypoint data file.
//!
//! The vault protects the single-file SQLite database behind the link
//! service. It manages immutable point-in-time snapshots in a dedicated
//! directory, restores them with rollback safety, prunes them by age,
//! and runs the backup-and-prune cycle on a schedule.
//!
//! The restore path guarantees that a failed restore leaves the data
//! file byte-identical to its state before the attempt. The one case
//! where that guarantee cannot hold (the rollback copy-back itself
//! fails) surfaces as the distinct [`VaultError::CorruptState`] and
//! leaves the [`ServiceGate`] engaged until an operator intervenes.

pub mod clock;
pub mod engine;
pub mod error;
pub mod gate;
pub mod schedule;
pub mod scheduler;
pub mod snapshot;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use engine::{
    BackupEngine, BackupList, FsBackupEngine, PruneReport, RestoreOutcome, VaultSettings,
};
pub use error::VaultError;
pub use gate::ServiceGate;
pub use schedule::{ScheduleParseError, ScheduleSpec};
pub use scheduler::BackupScheduler;
pub use snapshot::Snapshot;
pub use store::{FsSnapshotStore, SnapshotStore};
