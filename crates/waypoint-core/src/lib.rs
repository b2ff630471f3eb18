//! Core types and traits for the Waypoint link service.
//!
//! This crate provides the shared link record, the repository contract
//! and the validated short-code type used by the storage backends and
//! the HTTP gateway.

pub mod error;
pub mod repository;
pub mod shortcode;

pub use error::{CoreError, StorageError};
pub use repository::{LinkRecord, LinkUpdate, NewLink, ReadRepository, Repository};
pub use shortcode::ShortCode;
