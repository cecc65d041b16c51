//! Storage module for hubs, articles and parser logs
//!
//! Storage is the schedule of record: hub due-times and article pending
//! flags live here, so a restarted process resumes exactly where the last
//! one stopped.

mod schema;
mod sqlite;
mod traits;
mod value;

pub use schema::{initialize_schema, schema_sql};
pub use sqlite::{SqliteStorage, StorageStats};
pub use traits::{StorageError, StorageGateway, StorageResult};
pub use value::{format_timestamp, parse_timestamp, Field, FieldValue, TIMESTAMP_FORMAT};

use crate::config::StorageConfig;
use crate::crawler::StorageDialect;
use crate::HubwatchError;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Storage handle shared by the scheduler, fetcher and logger
///
/// The lock is only ever held for the duration of a synchronous storage
/// call, never across an await point.
pub type SharedStorage<S> = Arc<Mutex<S>>;

/// Wraps a storage backend for sharing
pub fn shared<S>(storage: S) -> SharedStorage<S> {
    Arc::new(Mutex::new(storage))
}

/// Locks a shared storage handle
pub fn lock<S>(storage: &SharedStorage<S>) -> StorageResult<MutexGuard<'_, S>> {
    storage.lock().map_err(|_| StorageError::LockPoisoned)
}

/// The three tables the core reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Hubs,
    Articles,
    Logs,
}

/// Physical names of the tables, as configured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub hubs: String,
    pub articles: String,
    pub logs: String,
}

impl TableNames {
    /// Returns the physical name of a table
    pub fn name(&self, table: Table) -> &str {
        match table {
            Table::Hubs => &self.hubs,
            Table::Articles => &self.articles,
            Table::Logs => &self.logs,
        }
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            hubs: "db_manager_habrs".to_string(),
            articles: "db_manager_articles".to_string(),
            logs: "db_manager_parserlogs".to_string(),
        }
    }
}

/// Quotes an SQL identifier
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Opens the storage backend selected by the configured dialect
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Storage opened and schema initialized
/// * `Err(HubwatchError)` - Unknown dialect or the database could not be opened
pub fn open_storage(config: &StorageConfig) -> Result<SqliteStorage, HubwatchError> {
    let tables = config.table_names();

    match StorageDialect::resolve(&config.dialect)? {
        StorageDialect::Sqlite => SqliteStorage::new(Path::new(&config.database_path), tables),
        StorageDialect::SqliteMemory => SqliteStorage::new_in_memory(tables),
    }
}

/// Opens the configured storage without changing it, for inspection
///
/// The file dialect opens the database read-only; the in-memory dialect has
/// nothing to inspect and yields an empty database.
pub fn open_storage_read_only(config: &StorageConfig) -> Result<SqliteStorage, HubwatchError> {
    let tables = config.table_names();

    match StorageDialect::resolve(&config.dialect)? {
        StorageDialect::Sqlite => {
            SqliteStorage::open_read_only(Path::new(&config.database_path), tables)
        }
        StorageDialect::SqliteMemory => SqliteStorage::new_in_memory(tables),
    }
}
