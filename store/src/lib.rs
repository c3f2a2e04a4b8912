//! File-backed entity storage for rosterhub.
//!
//! Each collection (users, teams, memberships, matches, events, ...) lives in
//! memory and is mirrored to one JSON array per collection in the data
//! directory. Route handlers talk to [`Storage`] only.

pub mod config;
pub mod password;
pub mod persistence;
mod storage;


pub use config::StorageConfig;
pub use persistence::{EntityId, EntityKind, PersistenceError, StorageStatus, StoreError};
pub use storage::{CollectionSummary, Storage};
