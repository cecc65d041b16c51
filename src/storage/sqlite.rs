//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the StorageGateway
//! trait, plus a few read helpers used by the CLI and tests.

use crate::model::{ArticleRecord, Hub, LogEntry, ParseStatus, PendingArticle};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StorageError, StorageGateway, StorageResult};
use crate::storage::value::{parse_timestamp, Field};
use crate::storage::{quote_ident, Table, TableNames};
use crate::HubwatchError;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::Path;

/// Row counts reported by `--stats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub hubs: u64,
    pub active_hubs: u64,
    pub articles: u64,
    pub pending_articles: u64,
    pub log_entries: u64,
}

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
    tables: TableNames,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `tables` - Physical table names
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(HubwatchError)` - Failed to open database
    pub fn new(path: &Path, tables: TableNames) -> Result<Self, HubwatchError> {
        let conn = Connection::open(path)?;

        // The admin console writes to the same file
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        initialize_schema(&conn, &tables)?;

        Ok(Self { conn, tables })
    }

    /// Creates an in-memory database
    pub fn new_in_memory(tables: TableNames) -> Result<Self, HubwatchError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn, &tables)?;
        Ok(Self { conn, tables })
    }

    /// Opens an existing database file for reading only
    ///
    /// No pragmas are set and no schema is created, so the file is left
    /// exactly as found. A missing file is an error.
    pub fn open_read_only(path: &Path, tables: TableNames) -> Result<Self, HubwatchError> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(Self { conn, tables })
    }

    /// Returns the configured table names
    pub fn tables(&self) -> &TableNames {
        &self.tables
    }

    fn table(&self, table: Table) -> String {
        quote_ident(self.tables.name(table))
    }

    fn write_error(&self, table: Table) -> impl FnOnce(rusqlite::Error) -> StorageError + '_ {
        move |source| StorageError::Write {
            table: self.tables.name(table).to_string(),
            source,
        }
    }

    /// Builds `INSERT INTO t (a, b) VALUES (?1, ?2)`
    fn insert_sql(&self, table: Table, fields: &[Field]) -> StorageResult<String> {
        if fields.is_empty() {
            return Err(StorageError::MissingFields {
                operation: "insert",
                what: "value",
            });
        }

        let columns: Vec<String> = fields.iter().map(|(col, _)| quote_ident(col)).collect();
        let placeholders: Vec<String> = (1..=fields.len()).map(|i| format!("?{}", i)).collect();

        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table(table),
            columns.join(", "),
            placeholders.join(", ")
        ))
    }

    // ===== Read helpers =====

    /// Gets a hub by name, active or not
    pub fn get_hub(&self, name: &str) -> StorageResult<Option<Hub>> {
        let sql = format!(
            "SELECT id, name, url, last_parsed, last_status, parse_interval_minutes, is_active
             FROM {} WHERE name = ?1",
            self.table(Table::Hubs)
        );

        let row = self
            .conn
            .query_row(&sql, params![name], HubRow::from_row)
            .optional()?;

        row.map(HubRow::into_hub).transpose()
    }

    /// Gets an article by its header
    pub fn get_article(&self, header: &str) -> StorageResult<Option<ArticleRecord>> {
        let sql = format!(
            "SELECT id, habr_id, url, header, date_collected, date_parsed, parse_this,
             last_status, article_text, article_date, author_name, author_url
             FROM {} WHERE header = ?1",
            self.table(Table::Articles)
        );

        let row = self
            .conn
            .query_row(&sql, params![header], ArticleRow::from_row)
            .optional()?;

        row.map(ArticleRow::into_record).transpose()
    }

    /// Lists all log entries in insertion order
    pub fn list_logs(&self) -> StorageResult<Vec<LogEntry>> {
        let sql = format!(
            "SELECT parser_name, log_dt, log_text FROM {} ORDER BY id",
            self.table(Table::Logs)
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(parser_name, log_dt, log_text)| {
                let log_dt = parse_column("log_dt", log_dt)?.ok_or_else(|| {
                    StorageError::InvalidTimestamp {
                        column: "log_dt",
                        value: "NULL".to_string(),
                    }
                })?;
                Ok(LogEntry {
                    parser_name,
                    log_dt,
                    log_text: log_text.unwrap_or_default(),
                })
            })
            .collect()
    }

    /// Counts hubs, articles and log entries
    pub fn stats(&self) -> StorageResult<StorageStats> {
        let count = |sql: String| -> StorageResult<u64> {
            let n: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
            Ok(n as u64)
        };

        let hubs = self.table(Table::Hubs);
        let articles = self.table(Table::Articles);
        let logs = self.table(Table::Logs);

        Ok(StorageStats {
            hubs: count(format!("SELECT COUNT(*) FROM {}", hubs))?,
            active_hubs: count(format!("SELECT COUNT(*) FROM {} WHERE is_active = 1", hubs))?,
            articles: count(format!("SELECT COUNT(*) FROM {}", articles))?,
            pending_articles: count(format!(
                "SELECT COUNT(*) FROM {} WHERE parse_this = 1",
                articles
            ))?,
            log_entries: count(format!("SELECT COUNT(*) FROM {}", logs))?,
        })
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl StorageGateway for SqliteStorage {
    fn get_due_hubs(&self) -> StorageResult<BTreeMap<String, Hub>> {
        let sql = format!(
            "SELECT id, name, url, last_parsed, last_status, parse_interval_minutes, is_active
             FROM {} WHERE is_active = 1",
            self.table(Table::Hubs)
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], HubRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut hubs = BTreeMap::new();
        for row in rows {
            let hub = row.into_hub()?;
            hubs.insert(hub.name.clone(), hub);
        }

        Ok(hubs)
    }

    fn get_pending_articles(&self) -> StorageResult<BTreeMap<String, PendingArticle>> {
        let sql = format!(
            "SELECT header, habr_id, url FROM {} WHERE parse_this = 1 AND header IS NOT NULL",
            self.table(Table::Articles)
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let articles = stmt
            .query_map([], |row| {
                Ok(PendingArticle {
                    header: row.get(0)?,
                    hub_id: row.get(1)?,
                    url: row.get(2)?,
                })
            })?
            .map(|article| article.map(|a| (a.header.clone(), a)))
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(articles)
    }

    fn insert(&mut self, table: Table, fields: &[Field]) -> StorageResult<()> {
        let sql = self.insert_sql(table, fields)?;
        self.conn
            .execute(&sql, params_from_iter(fields.iter().map(|(_, value)| value)))
            .map_err(self.write_error(table))?;
        Ok(())
    }

    fn insert_or_ignore(&mut self, table: Table, fields: &[Field]) -> StorageResult<bool> {
        // Only uniqueness conflicts are ignored; NOT NULL and foreign key
        // violations still surface as write errors.
        let sql = format!("{} ON CONFLICT DO NOTHING", self.insert_sql(table, fields)?);
        let changed = self
            .conn
            .execute(&sql, params_from_iter(fields.iter().map(|(_, value)| value)))
            .map_err(self.write_error(table))?;
        Ok(changed > 0)
    }

    fn update(
        &mut self,
        table: Table,
        where_fields: &[Field],
        set_fields: &[Field],
    ) -> StorageResult<usize> {
        if set_fields.is_empty() {
            return Err(StorageError::MissingFields {
                operation: "update",
                what: "set",
            });
        }
        if where_fields.is_empty() {
            return Err(StorageError::MissingFields {
                operation: "update",
                what: "where",
            });
        }

        let updates: Vec<String> = set_fields
            .iter()
            .enumerate()
            .map(|(i, (col, _))| format!("{} = ?{}", quote_ident(col), i + 1))
            .collect();
        let conditions: Vec<String> = where_fields
            .iter()
            .enumerate()
            .map(|(i, (col, _))| format!("{} = ?{}", quote_ident(col), set_fields.len() + i + 1))
            .collect();

        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            self.table(table),
            updates.join(", "),
            conditions.join(" AND ")
        );

        let values = set_fields
            .iter()
            .chain(where_fields.iter())
            .map(|(_, value)| value);

        let changed = self
            .conn
            .execute(&sql, params_from_iter(values))
            .map_err(self.write_error(table))?;

        Ok(changed)
    }
}

/// Raw hub row, before timestamps are parsed
struct HubRow {
    id: i64,
    name: String,
    url: String,
    last_parsed: Option<String>,
    last_status: Option<String>,
    parse_interval_minutes: i64,
    is_active: bool,
}

impl HubRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            url: row.get(2)?,
            last_parsed: row.get(3)?,
            last_status: row.get(4)?,
            parse_interval_minutes: row.get(5)?,
            is_active: row.get(6)?,
        })
    }

    fn into_hub(self) -> StorageResult<Hub> {
        let parse_interval = Duration::try_minutes(self.parse_interval_minutes).ok_or_else(|| {
            StorageError::InvalidInterval {
                hub: self.name.clone(),
                minutes: self.parse_interval_minutes,
            }
        })?;

        Ok(Hub {
            id: self.id,
            name: self.name,
            url: self.url,
            last_parsed: parse_column("last_parsed", self.last_parsed)?,
            last_status: self
                .last_status
                .as_deref()
                .and_then(ParseStatus::from_db_string),
            parse_interval,
            is_active: self.is_active,
        })
    }
}

/// Raw article row, before timestamps are parsed
struct ArticleRow {
    id: i64,
    hub_id: i64,
    url: String,
    header: String,
    date_collected: Option<String>,
    date_parsed: Option<String>,
    pending: bool,
    last_status: Option<String>,
    article_text: Option<String>,
    article_date: Option<String>,
    author_name: Option<String>,
    author_url: Option<String>,
}

impl ArticleRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            hub_id: row.get(1)?,
            url: row.get(2)?,
            header: row.get(3)?,
            date_collected: row.get(4)?,
            date_parsed: row.get(5)?,
            pending: row.get(6)?,
            last_status: row.get(7)?,
            article_text: row.get(8)?,
            article_date: row.get(9)?,
            author_name: row.get(10)?,
            author_url: row.get(11)?,
        })
    }

    fn into_record(self) -> StorageResult<ArticleRecord> {
        Ok(ArticleRecord {
            id: self.id,
            hub_id: self.hub_id,
            url: self.url,
            header: self.header,
            date_collected: parse_column("date_collected", self.date_collected)?,
            date_parsed: parse_column("date_parsed", self.date_parsed)?,
            pending: self.pending,
            last_status: self
                .last_status
                .as_deref()
                .and_then(ParseStatus::from_db_string),
            article_text: self.article_text,
            article_date: parse_column("article_date", self.article_date)?,
            author_name: self.author_name,
            author_url: self.author_url,
        })
    }
}

fn parse_column(
    column: &'static str,
    value: Option<String>,
) -> StorageResult<Option<DateTime<Utc>>> {
    match value {
        None => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or(StorageError::InvalidTimestamp { column, value: raw }),
    }
}
