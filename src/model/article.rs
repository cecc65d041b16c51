//! Article and log records

use crate::model::ParseStatus;
use chrono::{DateTime, Utc};

/// An article waiting to be (re)fetched, as selected by the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingArticle {
    pub header: String,
    pub hub_id: i64,
    pub url: String,
}

/// Author profile link extracted from an article page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorLink {
    pub name: String,
    pub url: String,
}

/// Fields extracted from an article page
///
/// Absence of a structural element on the page is a valid value here, not
/// an error: the matching field is simply `None` (or empty text).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleFields {
    pub article_date: Option<DateTime<Utc>>,
    pub author: Option<AuthorLink>,
    pub article_text: String,
}

/// An article row as persisted
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleRecord {
    pub id: i64,
    pub hub_id: i64,
    pub url: String,
    pub header: String,
    pub date_collected: Option<DateTime<Utc>>,
    pub date_parsed: Option<DateTime<Utc>>,
    pub pending: bool,
    pub last_status: Option<ParseStatus>,
    pub article_text: Option<String>,
    pub article_date: Option<DateTime<Utc>>,
    pub author_name: Option<String>,
    pub author_url: Option<String>,
}

/// One append-only log row
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub parser_name: String,
    pub log_dt: DateTime<Utc>,
    pub log_text: String,
}
