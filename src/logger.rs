//! Parser log: one row per message in storage, echoed to the console
//!
//! This is the only place a storage write failure is swallowed. Logging
//! must never take a tick down, so a rejected write is reported through
//! `tracing` and otherwise ignored.

use crate::storage::{lock, SharedStorage, StorageGateway, StorageResult, Table};
use chrono::{DateTime, Utc};

/// Writes parser messages to the log table and the console
pub struct Logger<S> {
    storage: SharedStorage<S>,
}

impl<S> Clone for Logger<S> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
        }
    }
}

impl<S: StorageGateway> Logger<S> {
    pub fn new(storage: SharedStorage<S>) -> Self {
        Self { storage }
    }

    /// Records `message` on behalf of `source`
    pub fn log(&self, message: &str, source: &str) {
        self.log_at(message, source, Utc::now());
    }

    /// Records `message` with an explicit timestamp
    pub fn log_at(&self, message: &str, source: &str, at: DateTime<Utc>) {
        if let Err(e) = self.write(message, source, at) {
            tracing::error!(parser = source, error = %e, "Failed to store log entry");
        }

        tracing::info!(parser = source, "{}", message);
    }

    fn write(&self, message: &str, source: &str, at: DateTime<Utc>) -> StorageResult<()> {
        let mut storage = lock(&self.storage)?;
        storage.insert(
            Table::Logs,
            &[
                ("parser_name", source.into()),
                ("log_dt", at.into()),
                ("log_text", message.into()),
            ],
        )
    }
}
