//! linkkeep Core Library
//!
//! This crate provides the core functionality for linkkeep, a personal
//! bookmark organizer that keeps links with descriptions, categories and
//! tags in a local JSON file.
//!
//! # Architecture
//!
//! - **Store**: in-memory source of truth for links and the label sets
//!   derived from them
//! - **Storage**: JSON persistence with backup-on-write, atomic replace
//!   and recovery from corrupted files
//!
//! Queries run directly against the in-memory store.
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let persistence = JsonPersistence::from_config(&config);
//! let mut store = persistence.load()?.store;
//!
//! // Add a link
//! store.add_link("example.com", "Example", ["reading"], ["rust"])?;
//!
//! // Query links
//! let hits = store.search(&SearchQuery::everywhere("rust"), SearchMode::Or);
//!
//! persistence.save(&store)?;
//! ```
//!
//! # Modules
//!
//! - `store`: Repository store (main entry point)
//! - `models`: Links, import/export records and edit patches
//! - `query`: Combined and advanced search
//! - `storage`: Link file persistence and backups
//! - `config`: Application configuration

pub mod config;
pub mod models;
pub mod query;
pub mod storage;
pub mod store;

pub use config::Config;
pub use models::{Link, LinkPatch, LinkRecord, ListEdit, ValidationError};
pub use query::{AdvancedQuery, QueryError, SearchField, SearchMode, SearchQuery};
pub use storage::{
    BackupManager, BackupOutcome, JsonPersistence, LoadOutcome, RestoreOutcome, StorageError,
    StorageResult,
};
pub use store::{ImportSummary, Store, StoreError, StoreResult};
