//! Storage traits and error types
//!
//! This module defines the contract every storage dialect implements and
//! the errors it reports.

use crate::model::{Hub, PendingArticle};
use crate::storage::value::Field;
use crate::storage::Table;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Write to {table} rejected: {source}")]
    Write {
        table: String,
        source: rusqlite::Error,
    },

    #[error("{operation} needs at least one {what} field")]
    MissingFields {
        operation: &'static str,
        what: &'static str,
    },

    #[error("Invalid timestamp in {column}: {value}")]
    InvalidTimestamp { column: &'static str, value: String },

    #[error("Hub {hub} has an unusable parse interval of {minutes} minutes")]
    InvalidInterval { hub: String, minutes: i64 },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Read/write contract over hub, article and log records
///
/// Reads select the scheduler's candidate work; writes are generic column
/// assignments against one of the three tables. Implementations must bind
/// every value as a parameter since callers pass scraped, untrusted text.
pub trait StorageGateway {
    /// Loads every active hub keyed by name
    ///
    /// These are the candidates for the due check; the scheduler applies
    /// [`Hub::is_due`] against the current time.
    fn get_due_hubs(&self) -> StorageResult<BTreeMap<String, Hub>>;

    /// Loads every article flagged as pending, keyed by header
    fn get_pending_articles(&self) -> StorageResult<BTreeMap<String, PendingArticle>>;

    /// Inserts one row
    fn insert(&mut self, table: Table, fields: &[Field]) -> StorageResult<()>;

    /// Inserts one row unless it conflicts with a uniqueness constraint
    ///
    /// Returns `true` if a row was inserted, `false` on a conflict.
    fn insert_or_ignore(&mut self, table: Table, fields: &[Field]) -> StorageResult<bool>;

    /// Updates the rows matching all `where_fields`
    ///
    /// Returns the number of rows changed.
    fn update(
        &mut self,
        table: Table,
        where_fields: &[Field],
        set_fields: &[Field],
    ) -> StorageResult<usize>;
}
