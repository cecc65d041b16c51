use crate::storage::TableNames;
use serde::Deserialize;

/// Main configuration structure for Hubwatch
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub site: SiteConfig,
}

/// Tick loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds to sleep before each tick
    #[serde(rename = "check-interval-secs", default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// Seconds the supervisor waits before restarting a failed run
    #[serde(rename = "restart-delay-secs", default = "default_restart_delay")]
    pub restart_delay_secs: u64,

    /// Task-type keys to run on each tick, in order
    #[serde(default = "default_tasks")]
    pub tasks: Vec<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval(),
            restart_delay_secs: default_restart_delay(),
            tasks: default_tasks(),
        }
    }
}

/// Page fetcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Maximum number of in-flight requests per batch
    #[serde(rename = "concurrency-limit", default = "default_concurrency_limit")]
    pub concurrency_limit: usize,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default)]
    pub user_agent: Option<String>,

    /// Whole-request timeout; the transport default applies when unset
    #[serde(rename = "request-timeout-secs", default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: default_concurrency_limit(),
            user_agent: None,
            request_timeout_secs: None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Storage dialect key, resolved at startup
    #[serde(default = "default_dialect")]
    pub dialect: String,

    /// Path to the SQLite database file
    #[serde(rename = "database-path", default)]
    pub database_path: String,

    #[serde(rename = "hubs-table", default = "default_hubs_table")]
    pub hubs_table: String,

    #[serde(rename = "articles-table", default = "default_articles_table")]
    pub articles_table: String,

    #[serde(rename = "logs-table", default = "default_logs_table")]
    pub logs_table: String,
}

impl StorageConfig {
    /// Returns the configured physical table names
    pub fn table_names(&self) -> TableNames {
        TableNames {
            hubs: self.hubs_table.clone(),
            articles: self.articles_table.clone(),
            logs: self.logs_table.clone(),
        }
    }
}

/// Scraped site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Origin relative article and author links are resolved against
    #[serde(default = "default_origin")]
    pub origin: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
        }
    }
}

fn default_check_interval() -> u64 {
    60
}

fn default_restart_delay() -> u64 {
    10
}

fn default_tasks() -> Vec<String> {
    vec!["hubs".to_string(), "articles".to_string()]
}

fn default_concurrency_limit() -> usize {
    5
}

fn default_dialect() -> String {
    "sqlite".to_string()
}

fn default_hubs_table() -> String {
    TableNames::default().hubs
}

fn default_articles_table() -> String {
    TableNames::default().articles
}

fn default_logs_table() -> String {
    TableNames::default().logs
}

fn default_origin() -> String {
    "https://habr.com".to_string()
}
