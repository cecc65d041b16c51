//! Hubwatch: a scheduled hub and article scraper
//!
//! This crate periodically scrapes listing pages ("hubs"), discovers article
//! links on them, and extracts publication date, author and body text from
//! each article page. Storage doubles as the schedule of record.

pub mod config;
pub mod crawler;
pub mod extraction;
pub mod logger;
pub mod model;
pub mod storage;

use thiserror::Error;

/// Main error type for Hubwatch operations
#[derive(Debug, Error)]
pub enum HubwatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Unknown {kind} \"{key}\"")]
    UnknownKey { kind: &'static str, key: String },
}

/// Result type alias for Hubwatch operations
pub type Result<T> = std::result::Result<T, HubwatchError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{PageFetcher, StorageDialect, TaskKind, TaskScheduler};
pub use model::{Hub, ParseStatus, PendingArticle};
