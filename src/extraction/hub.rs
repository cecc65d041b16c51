//! Hub pages: discover article links and stamp the hub

use crate::crawler::FetchJob;
use crate::extraction::{resolve_href, ExtractionReport, ExtractionStrategy};
use crate::model::{Hub, ParseStatus};
use crate::storage::{StorageGateway, StorageResult, Table};
use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use url::Url;

/// Article heading on a hub page
const HEADING_SELECTOR: &str = "h2.tm-title.tm-title_h2";
const LINK_SELECTOR: &str = "a[href]";
const LABEL_SELECTOR: &str = "span";

/// An article link found on a hub page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredArticle {
    pub header: String,
    pub url: String,
}

/// Extraction strategy for hub (listing) pages
///
/// Every heading link becomes a pending article, inserted only if no
/// article with the same header exists. A hub whose page was fetched is
/// stamped `last_parsed = now` with a success status even when it lists no
/// articles. A hub whose fetch failed or came back empty gets a failed status and keeps its
/// old `last_parsed`, so it is due again on the next tick.
#[derive(Debug, Clone)]
pub struct HubExtraction {
    origin: Url,
}

impl HubExtraction {
    pub fn new(origin: Url) -> Self {
        Self { origin }
    }

    /// Finds all article headings on a hub page
    ///
    /// Headings without a link, a label, or a usable href are skipped.
    pub fn parse_headings(&self, html: &str) -> Vec<DiscoveredArticle> {
        let document = Html::parse_document(html);

        let (Ok(heading), Ok(link), Ok(label)) = (
            Selector::parse(HEADING_SELECTOR),
            Selector::parse(LINK_SELECTOR),
            Selector::parse(LABEL_SELECTOR),
        ) else {
            return Vec::new();
        };

        let mut found = Vec::new();
        for element in document.select(&heading) {
            let Some(anchor) = element.select(&link).next() else {
                continue;
            };

            let header = anchor
                .select(&label)
                .next()
                .map(|span| span.text().collect::<String>().trim().to_string())
                .unwrap_or_default();

            let url = anchor
                .value()
                .attr("href")
                .and_then(|href| resolve_href(&self.origin, href));

            match url {
                Some(url) if !header.is_empty() => found.push(DiscoveredArticle { header, url }),
                _ => tracing::debug!("Skipping heading without header or link"),
            }
        }

        found
    }
}

impl ExtractionStrategy for HubExtraction {
    type Task = Hub;

    fn extract<S: StorageGateway + ?Sized>(
        &self,
        jobs: Vec<FetchJob<Hub>>,
        storage: &mut S,
        now: DateTime<Utc>,
    ) -> StorageResult<ExtractionReport> {
        let mut report = ExtractionReport::default();

        for job in jobs {
            let hub = job.context;

            let Some(html) = job.body.filter(|body| !body.is_empty()) else {
                tracing::warn!(
                    hub = %hub.name,
                    url = %job.url,
                    "Hub page not fetched, will retry next tick"
                );
                storage.update(
                    Table::Hubs,
                    &[("id", hub.id.into())],
                    &[("last_status", ParseStatus::Failed.to_db_string().into())],
                )?;
                report.failed += 1;
                continue;
            };

            let articles = self.parse_headings(&html);
            let mut inserted = 0;

            for article in &articles {
                tracing::debug!(header = %article.header, url = %article.url, "Found article");

                let is_new = storage.insert_or_ignore(
                    Table::Articles,
                    &[
                        ("url", article.url.as_str().into()),
                        ("date_collected", now.into()),
                        ("parse_this", true.into()),
                        ("header", article.header.as_str().into()),
                        ("habr_id", hub.id.into()),
                    ],
                )?;

                if is_new {
                    inserted += 1;
                }
            }

            storage.update(
                Table::Hubs,
                &[("id", hub.id.into())],
                &[
                    ("last_parsed", now.into()),
                    ("last_status", ParseStatus::Success.to_db_string().into()),
                ],
            )?;

            tracing::info!(
                hub = %hub.name,
                found = articles.len(),
                new = inserted,
                "Hub parsed"
            );

            report.processed += 1;
            report.discovered += articles.len();
            report.inserted += inserted;
        }

        Ok(report)
    }
}
