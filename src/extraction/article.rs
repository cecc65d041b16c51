//! Article pages: publication date, author and body text

use crate::crawler::FetchJob;
use crate::extraction::{resolve_href, truncate_for_display, ExtractionReport, ExtractionStrategy};
use crate::model::{ArticleFields, AuthorLink, ParseStatus, PendingArticle};
use crate::storage::{StorageGateway, StorageResult, Table};
use chrono::{DateTime, NaiveDateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use url::Url;

const PUBLISHED_SELECTOR: &str = "span.tm-article-datetime-published time";
const PUBLISHED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";
const AUTHOR_SELECTOR: &str = "a.tm-user-info__username";
const CONTENT_SELECTOR: &str = r#"div[xmlns="http://www.w3.org/1999/xhtml"]"#;
const TEXT_BLOCK_SELECTOR: &str = "p, h2";

/// Longest field value echoed to the console
const DISPLAY_CHARS: usize = 150;

/// Extraction strategy for article pages
///
/// A fetched article is marked done (`parse_this = 0`) with whatever fields
/// could be found. An article whose fetch failed or came back empty is left
/// untouched, still
/// pending, and is retried on the next tick.
#[derive(Debug, Clone)]
pub struct ArticleExtraction {
    origin: Url,
}

impl ArticleExtraction {
    pub fn new(origin: Url) -> Self {
        Self { origin }
    }

    /// Extracts all fields from an article page
    ///
    /// Each field is looked up independently; a missing element only
    /// empties its own field.
    pub fn extract_fields(&self, html: &str) -> ArticleFields {
        let document = Html::parse_document(html);

        ArticleFields {
            article_date: publication_date(&document),
            author: self.author(&document),
            article_text: article_text(&document),
        }
    }

    fn author(&self, document: &Html) -> Option<AuthorLink> {
        let selector = Selector::parse(AUTHOR_SELECTOR).ok()?;
        let anchor = document.select(&selector).next()?;

        let url = resolve_href(&self.origin, anchor.value().attr("href")?)?;
        let name = anchor.text().collect::<String>().trim().to_string();

        Some(AuthorLink { name, url })
    }
}

/// Parses the machine-readable publication time
fn publication_date(document: &Html) -> Option<DateTime<Utc>> {
    let selector = Selector::parse(PUBLISHED_SELECTOR).ok()?;
    let datetime = document.select(&selector).next()?.value().attr("datetime")?;

    NaiveDateTime::parse_from_str(datetime.trim(), PUBLISHED_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Collects the body text of the main content container
///
/// Paragraphs and subheadings come first, in document order, followed by
/// any loose text sitting directly in the container. Blocks are joined with
/// newlines. Returns an empty string if there is no container.
fn article_text(document: &Html) -> String {
    let (Ok(content), Ok(blocks)) = (
        Selector::parse(CONTENT_SELECTOR),
        Selector::parse(TEXT_BLOCK_SELECTOR),
    ) else {
        return String::new();
    };

    let Some(container) = document.select(&content).next() else {
        return String::new();
    };

    let mut parts: Vec<String> = container
        .select(&blocks)
        .map(block_text)
        .filter(|text| !text.is_empty())
        .collect();

    parts.extend(
        container
            .children()
            .filter_map(|node| node.value().as_text())
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
            .map(str::to_string),
    );

    parts.join("\n")
}

/// Text of one block, whitespace-trimmed fragments joined by single spaces
fn block_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl ExtractionStrategy for ArticleExtraction {
    type Task = PendingArticle;

    fn extract<S: StorageGateway + ?Sized>(
        &self,
        jobs: Vec<FetchJob<PendingArticle>>,
        storage: &mut S,
        now: DateTime<Utc>,
    ) -> StorageResult<ExtractionReport> {
        let mut report = ExtractionReport::default();

        for job in jobs {
            let article = job.context;

            let Some(html) = job.body.filter(|body| !body.is_empty()) else {
                tracing::warn!(
                    header = %article.header,
                    url = %job.url,
                    "Article not fetched, stays pending"
                );
                report.failed += 1;
                continue;
            };

            let fields = self.extract_fields(&html);
            let (author_name, author_url) = match fields.author {
                Some(AuthorLink { name, url }) => (Some(name), Some(url)),
                None => (None, None),
            };

            tracing::info!(
                url = %job.url,
                header = %truncate_for_display(&article.header, DISPLAY_CHARS),
                date = ?fields.article_date,
                author = ?author_name,
                author_url = ?author_url,
                text = %truncate_for_display(&fields.article_text, DISPLAY_CHARS),
                "Article parsed"
            );

            storage.update(
                Table::Articles,
                &[("header", article.header.as_str().into())],
                &[
                    ("date_parsed", now.into()),
                    ("last_status", ParseStatus::Success.to_db_string().into()),
                    ("parse_this", false.into()),
                    ("article_text", fields.article_text.into()),
                    ("article_date", fields.article_date.into()),
                    ("author_name", author_name.into()),
                    ("author_url", author_url.into()),
                ],
            )?;

            report.processed += 1;
        }

        Ok(report)
    }
}
