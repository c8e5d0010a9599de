//! Persistence for tracked tours and their latest availability
//!
//! Business logic depends on the [`LatestAvailabilityStore`] and
//! [`TourRepository`] traits only, so the SQLite backend can be swapped for the
//! in-memory one in tests.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │     TourUpdater / API / commands         │
//! └──────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌──────────────────────────────────────────┐
//! │ LatestAvailabilityStore, TourRepository  │
//! └──────────────────────────────────────────┘
//!            │                    │
//!            ▼                    ▼
//!   ┌─────────────────┐  ┌─────────────────┐
//!   │   SqliteStore   │  │   MemoryStore   │
//!   └─────────────────┘  └─────────────────┘
//! ```

pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{StoredAvailability, Tour};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by storage backends
#[derive(Error, Debug)]
pub enum StorageError {
    /// SQLite failure
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Could not encode or decode a stored payload
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored column could not be interpreted
    #[error("Invalid value in column '{column}': {reason}")]
    InvalidRecord { column: &'static str, reason: String },

    /// The connection mutex was poisoned by a panicking writer
    #[error("Storage lock poisoned")]
    LockPoisoned,

    /// Blocking task failed to complete
    #[error("Storage task failed: {0}")]
    Task(String),

    /// Filesystem error while preparing the database path
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub(crate) fn invalid(column: &'static str, reason: impl ToString) -> Self {
        Self::InvalidRecord {
            column,
            reason: reason.to_string(),
        }
    }

    /// Busy/locked databases and task failures may clear up on the next tick
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Database(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            Self::Task(_) | Self::Io(_) => true,
            _ => false,
        }
    }
}

/// Per-tour "best known slot" persistence
///
/// A missing record is reported as `Ok(None)`, never as an error.
#[async_trait]
pub trait LatestAvailabilityStore: Send + Sync {
    /// Load the stored best slot for a tour
    async fn get_latest(&self, tour_id: Uuid) -> StorageResult<Option<StoredAvailability>>;

    /// Store `record` unless the stored best slot starts at the same instant
    /// or later; returns whether it was written.
    ///
    /// The comparison happens inside the write, so concurrent writers for the
    /// same tour can never move the stored date backwards.
    async fn put_latest(&self, record: &StoredAvailability) -> StorageResult<bool>;
}

/// Persistence for the set of tracked tours
#[async_trait]
pub trait TourRepository: Send + Sync {
    /// All tracked tours, ordered by name
    async fn list_tours(&self) -> StorageResult<Vec<Tour>>;

    /// Get a tour by id
    async fn get_tour(&self, id: Uuid) -> StorageResult<Option<Tour>>;

    /// Insert or replace a tour
    async fn upsert_tour(&self, tour: &Tour) -> StorageResult<()>;

    /// Delete a tour; returns whether it existed
    async fn delete_tour(&self, id: Uuid) -> StorageResult<bool>;
}

/// Thread-safe shared availability store
pub type SharedAvailabilityStore = Arc<dyn LatestAvailabilityStore>;

/// Thread-safe shared tour repository
pub type SharedTourRepository = Arc<dyn TourRepository>;
