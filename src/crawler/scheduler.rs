//! Tick scheduler
//!
//! Each tick reads the schedule from storage, fetches every due hub and
//! every pending article, and hands the fetched batches to their extraction
//! strategies. Storage is the only state carried from one tick to the next.

use crate::config::Config;
use crate::crawler::{FetchJob, PageFetcher, TaskKind, Transport};
use crate::extraction::{ArticleExtraction, ExtractionReport, ExtractionStrategy, HubExtraction};
use crate::logger::Logger;
use crate::model::{Hub, PendingArticle};
use crate::storage::{lock, SharedStorage, StorageGateway};
use crate::Result;
use chrono::{DateTime, Utc};
use std::time::Duration;
use url::Url;

/// What one tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Active hubs that were not due yet
    pub skipped_hubs: usize,
    pub hubs: ExtractionReport,
    pub articles: ExtractionReport,
}

impl TickReport {
    /// Returns true if the tick found no due hub and no pending article
    pub fn is_idle(&self) -> bool {
        self.hubs.processed + self.hubs.failed + self.articles.processed + self.articles.failed
            == 0
    }
}

/// Drives the periodic scrape
pub struct TaskScheduler<S, T> {
    storage: SharedStorage<S>,
    fetcher: PageFetcher<T, S>,
    hubs: HubExtraction,
    articles: ArticleExtraction,
    tasks: Vec<TaskKind>,
    check_interval: Duration,
}

impl<S: StorageGateway, T: Transport> TaskScheduler<S, T> {
    /// Creates a scheduler over shared storage and a transport
    ///
    /// # Returns
    ///
    /// * `Ok(TaskScheduler)` - Ready to tick
    /// * `Err(HubwatchError)` - Unknown task type or unparseable site origin
    pub fn new(storage: SharedStorage<S>, transport: T, config: &Config) -> Result<Self> {
        let origin = Url::parse(&config.site.origin)?;

        let mut tasks = Vec::new();
        for key in &config.scheduler.tasks {
            let kind = TaskKind::resolve(key)?;
            if !tasks.contains(&kind) {
                tasks.push(kind);
            }
        }

        let logger = Logger::new(storage.clone());
        let fetcher = PageFetcher::new(transport, logger, config.fetcher.concurrency_limit);

        Ok(Self {
            storage,
            fetcher,
            hubs: HubExtraction::new(origin.clone()),
            articles: ArticleExtraction::new(origin),
            tasks,
            check_interval: Duration::from_secs(config.scheduler.check_interval_secs),
        })
    }

    pub fn storage(&self) -> &SharedStorage<S> {
        &self.storage
    }

    /// Task types dispatched on each tick, in order
    pub fn tasks(&self) -> &[TaskKind] {
        &self.tasks
    }

    /// Runs one tick at the current time
    pub async fn tick(&self) -> Result<TickReport> {
        self.tick_at(Utc::now()).await
    }

    /// Runs one tick, stamping every write with `now`
    ///
    /// Both work lists are read before anything is fetched, so articles
    /// discovered by this tick are picked up by the next one. A storage
    /// error aborts the tick; fetch failures never do.
    pub async fn tick_at(&self, now: DateTime<Utc>) -> Result<TickReport> {
        let (candidates, pending) = {
            let storage = lock(&self.storage)?;
            (storage.get_due_hubs()?, storage.get_pending_articles()?)
        };

        let mut report = TickReport::default();
        let mut hub_jobs: Vec<FetchJob<Hub>> = Vec::new();

        for (name, hub) in candidates {
            if hub.is_due(now) {
                hub_jobs.push(FetchJob::new(hub.url.clone(), hub));
            } else {
                tracing::debug!(hub = %name, next_due = ?hub.next_due(), "Hub not due yet");
                report.skipped_hubs += 1;
            }
        }

        let mut article_jobs: Vec<FetchJob<PendingArticle>> = pending
            .into_values()
            .map(|article| FetchJob::new(article.url.clone(), article))
            .collect();

        if hub_jobs.is_empty() && article_jobs.is_empty() {
            tracing::info!("Nothing to do, no hubs due and no pending articles");
            return Ok(report);
        }

        for kind in &self.tasks {
            match kind {
                TaskKind::Hubs => {
                    let jobs = std::mem::take(&mut hub_jobs);
                    if jobs.is_empty() {
                        continue;
                    }

                    tracing::info!("Fetching {} hub page(s)", jobs.len());
                    let fetched = self.fetcher.fetch_all(jobs, kind.parser_name()).await;

                    let mut storage = lock(&self.storage)?;
                    report.hubs = self.hubs.extract(fetched, &mut *storage, now)?;
                }
                TaskKind::Articles => {
                    let jobs = std::mem::take(&mut article_jobs);
                    if jobs.is_empty() {
                        continue;
                    }

                    tracing::info!("Fetching {} article page(s)", jobs.len());
                    let fetched = self.fetcher.fetch_all(jobs, kind.parser_name()).await;

                    let mut storage = lock(&self.storage)?;
                    report.articles = self.articles.extract(fetched, &mut *storage, now)?;
                }
            }
        }

        tracing::info!(
            hubs = report.hubs.processed,
            hubs_failed = report.hubs.failed,
            new_articles = report.hubs.inserted,
            articles = report.articles.processed,
            articles_failed = report.articles.failed,
            "Tick complete"
        );

        Ok(report)
    }

    /// Ticks forever, sleeping `check-interval-secs` before each tick
    ///
    /// Returns `Ok(())` on Ctrl-C and the first tick error otherwise.
    pub async fn run(&self) -> Result<()> {
        tracing::info!(
            "Scheduler started: tasks {:?}, checking every {}s",
            self.tasks.iter().map(TaskKind::key).collect::<Vec<_>>(),
            self.check_interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.check_interval) => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted, stopping scheduler");
                    return Ok(());
                }
            }

            self.tick().await?;
        }
    }
}
