//! Extraction strategies: fetched HTML in, storage writes out
//!
//! Both strategies run only after a whole batch has been fetched, and
//! tolerate missing page structure: an absent element yields an empty
//! field, never an error. Only storage failures are reported.

mod article;
mod hub;

pub use article::ArticleExtraction;
pub use hub::{DiscoveredArticle, HubExtraction};

use crate::crawler::FetchJob;
use crate::storage::{StorageGateway, StorageResult};
use chrono::{DateTime, Utc};
use url::Url;

/// Counters for one extraction pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Jobs whose page was fetched and processed
    pub processed: usize,

    /// Jobs whose fetch failed
    pub failed: usize,

    /// Article links found on hub pages
    pub discovered: usize,

    /// Article rows newly inserted (the rest already existed)
    pub inserted: usize,
}

/// Turns a fetched batch into storage writes
pub trait ExtractionStrategy {
    /// Caller context carried by each job
    type Task;

    /// Processes a completed batch, stamping every record with `now`
    fn extract<S: StorageGateway + ?Sized>(
        &self,
        jobs: Vec<FetchJob<Self::Task>>,
        storage: &mut S,
        now: DateTime<Utc>,
    ) -> StorageResult<ExtractionReport>;
}

/// Resolves a link href against the site origin
///
/// Returns None if the link should be ignored:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel: and data: links
/// - anything that does not resolve to http(s)
pub(crate) fn resolve_href(origin: &Url, href: &str) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute = origin.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute.to_string()),
        _ => None,
    }
}

/// Shortens text for console output, on a char boundary
pub(crate) fn truncate_for_display(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
