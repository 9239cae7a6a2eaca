//! Storage layer
//!
//! Handles the link file on disk and its backups.
//!
//! ## Architecture
//!
//! - **Link file**: the store serialized as pretty-printed JSON
//! - **Backups**: whole-file copies taken before every save and restore
//!
//! The in-memory [`Store`](crate::store::Store) is the source of truth while
//! the program runs; it is written back with an atomic replace.

pub mod backup;
pub mod error;
mod format;
pub mod persistence;

pub use backup::{BackupManager, BackupOutcome};
pub use error::{StorageError, StorageResult};
pub use persistence::{JsonPersistence, LoadOutcome, RestoreOutcome};
