//! Repository implementations for the Waypoint link service.
//!
//! Two backends are provided: an in-memory repository for tests and
//! local development, and the SQLite repository backing production.

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryRepository;
pub use sqlite::SqliteRepository;

pub use waypoint_core::{ReadRepository, Repository};
