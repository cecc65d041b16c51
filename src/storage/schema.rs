//! Database schema definitions
//!
//! The tables mirror the ones the admin console creates, so an existing
//! console-owned database is opened as-is and a fresh one gets the same
//! layout.

use crate::storage::{quote_ident, TableNames};

/// Builds the schema SQL for the configured table names
pub fn schema_sql(tables: &TableNames) -> String {
    let hubs = quote_ident(&tables.hubs);
    let articles = quote_ident(&tables.articles);
    let logs = quote_ident(&tables.logs);
    let articles_pending_idx = quote_ident(&format!("{}_parse_this_idx", tables.articles));
    let articles_hub_idx = quote_ident(&format!("{}_habr_id_idx", tables.articles));

    format!(
        r#"
-- Hubs: listing pages parsed on an interval
CREATE TABLE IF NOT EXISTS {hubs} (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(100) NOT NULL UNIQUE,
    url VARCHAR(200) NOT NULL,
    last_parsed DATETIME NULL,
    last_status VARCHAR(100) NULL,
    parse_interval_minutes INTEGER UNSIGNED NOT NULL DEFAULT 10
        CHECK (parse_interval_minutes >= 0),
    is_active BOOL NOT NULL DEFAULT 0
);

-- Articles discovered on hubs
CREATE TABLE IF NOT EXISTS {articles} (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    habr_id INTEGER NOT NULL REFERENCES {hubs}(id),
    url VARCHAR(200) NOT NULL,
    date_collected DATETIME NULL,
    date_parsed DATETIME NULL,
    last_status VARCHAR(100) NULL,
    parse_this BOOL NOT NULL DEFAULT 1,
    header TEXT NULL UNIQUE,
    article_text TEXT NULL,
    article_date DATETIME NULL,
    author_name VARCHAR(100) NULL,
    author_url VARCHAR(200) NULL
);

CREATE INDEX IF NOT EXISTS {articles_pending_idx} ON {articles}(parse_this);
CREATE INDEX IF NOT EXISTS {articles_hub_idx} ON {articles}(habr_id);

-- Append-only parser log
CREATE TABLE IF NOT EXISTS {logs} (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parser_name VARCHAR(100) NOT NULL,
    log_dt DATETIME NULL,
    log_text TEXT NULL
);
"#
    )
}

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `tables` - Table names to create
pub fn initialize_schema(
    conn: &rusqlite::Connection,
    tables: &TableNames,
) -> Result<(), rusqlite::Error> {
    conn.execute_batch(&schema_sql(tables))?;
    Ok(())
}
