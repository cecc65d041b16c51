//! Bounded-concurrency page fetcher
//!
//! A batch of jobs is fetched concurrently on the current task, with a
//! counting semaphore admitting at most `concurrency_limit` requests at a
//! time. Every job comes back exactly once: with the page body on HTTP 200,
//! or without one on any other status or transport error. Failed jobs are
//! not retried within the batch.

use crate::config::FetcherConfig;
use crate::logger::Logger;
use crate::storage::StorageGateway;
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;

/// Default admission gate size
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 5;

/// One page to fetch, plus whatever the caller needs to act on the result
#[derive(Debug, Clone, PartialEq)]
pub struct FetchJob<C> {
    pub url: String,
    pub context: C,
    /// Page body once fetched; `None` until then, and after a failed fetch
    pub body: Option<String>,
}

impl<C> FetchJob<C> {
    pub fn new(url: impl Into<String>, context: C) -> Self {
        Self {
            url: url.into(),
            context,
            body: None,
        }
    }
}

/// Transport-level failure (connection, TLS, body read, ...)
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self("Request timeout".to_string())
        } else if e.is_connect() {
            Self(format!("Connection failed: {}", e))
        } else {
            Self(e.to_string())
        }
    }
}

/// Status and body of a single GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    /// Empty unless the status is 200
    pub body: String,
}

/// Performs a single GET
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<TransportResponse, TransportError>;
}

/// Production transport over a shared reqwest client
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Builds the HTTP session
    ///
    /// This is the only fetch failure that is not isolated to a single job:
    /// without a client no batch can run.
    pub fn new(config: &FetcherConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse, TransportError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        let body = if status == StatusCode::OK {
            response.text().await?
        } else {
            String::new()
        };

        Ok(TransportResponse {
            status: status.as_u16(),
            body,
        })
    }
}

/// Builds an HTTP client with the configured user agent and timeout
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    let user_agent = config
        .user_agent
        .clone()
        .unwrap_or_else(|| format!("hubwatch/{}", env!("CARGO_PKG_VERSION")));

    let mut builder = Client::builder().user_agent(user_agent).gzip(true).brotli(true);

    if let Some(secs) = config.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    builder.build()
}

/// Result of fetching one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// HTTP 200 with the page body
    Success { body: String },

    /// Any status other than 200
    HttpError { status_code: u16 },

    /// The request did not complete
    NetworkError { error: String },
}

/// Fetches batches of pages with a cap on concurrent requests
pub struct PageFetcher<T, S> {
    transport: T,
    logger: Logger<S>,
    concurrency_limit: usize,
}

impl<T: Transport, S: StorageGateway> PageFetcher<T, S> {
    /// Creates a fetcher
    ///
    /// The limit is clamped to `1..=Semaphore::MAX_PERMITS`.
    pub fn new(transport: T, logger: Logger<S>, concurrency_limit: usize) -> Self {
        Self {
            transport,
            logger,
            concurrency_limit: concurrency_limit.clamp(1, Semaphore::MAX_PERMITS),
        }
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// Fetches every job and returns them with their bodies filled in
    ///
    /// Returns once all fetches have resolved, one output per input job in
    /// input order. Each outcome is logged under `source`.
    pub async fn fetch_all<C>(&self, jobs: Vec<FetchJob<C>>, source: &str) -> Vec<FetchJob<C>> {
        let gate = Semaphore::new(self.concurrency_limit);
        let gate = &gate;

        let fetches = jobs.into_iter().map(|mut job| async move {
            // The gate is owned by this call and never closed
            let _permit = gate.acquire().await.ok();
            let outcome = self.fetch_one(&job.url).await;

            match outcome {
                FetchOutcome::Success { body } => {
                    self.logger
                        .log(&format!("URL {} was successfully fetched!", job.url), source);
                    job.body = Some(body);
                }
                FetchOutcome::HttpError { status_code } => {
                    self.logger.log(
                        &format!("Failed to fetch url {} (HTTP {})", job.url, status_code),
                        source,
                    );
                    job.body = None;
                }
                FetchOutcome::NetworkError { error } => {
                    self.logger
                        .log(&format!("Failed to fetch url {} ({})", job.url, error), source);
                    job.body = None;
                }
            }

            job
        });

        join_all(fetches).await
    }

    /// Fetches a single URL
    pub async fn fetch_one(&self, url: &str) -> FetchOutcome {
        match self.transport.get(url).await {
            Ok(response) if response.status == 200 => FetchOutcome::Success {
                body: response.body,
            },
            Ok(response) => FetchOutcome::HttpError {
                status_code: response.status,
            },
            Err(e) => FetchOutcome::NetworkError {
                error: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{shared, SqliteStorage, TableNames};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Answers 200 for every URL except those containing "missing" (404)
    /// or "down" (transport error), tracking peak concurrency.
    #[derive(Default)]
    struct MockTransport {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for Arc<MockTransport> {
        async fn get(&self, url: &str) -> Result<TransportResponse, TransportError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);

            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if url.contains("down") {
                Err(TransportError("Connection refused".to_string()))
            } else if url.contains("missing") {
                Ok(TransportResponse {
                    status: 404,
                    body: String::new(),
                })
            } else {
                Ok(TransportResponse {
                    status: 200,
                    body: format!("<html>{}</html>", url),
                })
            }
        }
    }

    fn fetcher(
        limit: usize,
    ) -> (
        PageFetcher<Arc<MockTransport>, SqliteStorage>,
        Arc<MockTransport>,
        crate::storage::SharedStorage<SqliteStorage>,
    ) {
        let storage = shared(SqliteStorage::new_in_memory(TableNames::default()).unwrap());
        let transport = Arc::new(MockTransport::default());
        let fetcher = PageFetcher::new(transport.clone(), Logger::new(storage.clone()), limit);
        (fetcher, transport, storage)
    }

    fn jobs(n: usize) -> Vec<FetchJob<usize>> {
        (0..n)
            .map(|i| FetchJob::new(format!("https://habr.com/page/{}", i), i))
            .collect()
    }

    #[tokio::test]
    async fn test_one_result_per_job_and_peak_within_limit() {
        for limit in [1, 5, 20] {
            let (fetcher, transport, _storage) = fetcher(limit);

            let results = fetcher.fetch_all(jobs(12), "test").await;

            assert_eq!(results.len(), 12);
            let contexts: Vec<usize> = results.iter().map(|job| job.context).collect();
            assert_eq!(contexts, (0..12).collect::<Vec<_>>());
            assert!(results.iter().all(|job| job.body.is_some()));

            let peak = transport.peak.load(Ordering::SeqCst);
            assert!(peak <= limit, "peak {} exceeded limit {}", peak, limit);
            assert_eq!(transport.calls.load(Ordering::SeqCst), 12);
        }
    }

    #[tokio::test]
    async fn test_limit_is_actually_used() {
        let (fetcher, transport, _storage) = fetcher(5);
        fetcher.fetch_all(jobs(10), "test").await;
        assert!(transport.peak.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn test_failures_are_isolated_and_logged() {
        let (fetcher, _transport, storage) = fetcher(2);
        let batch = vec![
            FetchJob::new("https://habr.com/ok", "ok"),
            FetchJob::new("https://habr.com/missing", "missing"),
            FetchJob::new("https://down.habr.com/", "down"),
        ];

        let results = fetcher.fetch_all(batch, "Articles parser").await;

        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0].body.as_deref(),
            Some("<html>https://habr.com/ok</html>")
        );
        assert_eq!(results[1].body, None);
        assert_eq!(results[2].body, None);

        let logs = storage.lock().unwrap().list_logs().unwrap();
        assert_eq!(logs.len(), 3);
        assert!(logs.iter().all(|entry| entry.parser_name == "Articles parser"));
        assert!(logs
            .iter()
            .any(|entry| entry.log_text == "URL https://habr.com/ok was successfully fetched!"));
        assert!(logs
            .iter()
            .any(|entry| entry.log_text.starts_with("Failed to fetch url https://habr.com/missing")));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let (fetcher, transport, _storage) = fetcher(5);
        let results = fetcher.fetch_all(Vec::<FetchJob<()>>::new(), "test").await;
        assert!(results.is_empty());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_zero_limit_is_raised() {
        let (fetcher, _transport, _storage) = fetcher(0);
        assert_eq!(fetcher.concurrency_limit(), 1);
    }

    #[tokio::test]
    async fn test_oversized_limit_is_capped() {
        let (fetcher, transport, _storage) = fetcher(usize::MAX);
        assert_eq!(fetcher.concurrency_limit(), Semaphore::MAX_PERMITS);

        let results = fetcher.fetch_all(jobs(3), "test").await;
        assert_eq!(results.len(), 3);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&FetcherConfig::default()).is_ok());

        let config = FetcherConfig {
            user_agent: Some("TestCrawler/1.0".to_string()),
            request_timeout_secs: Some(5),
            ..FetcherConfig::default()
        };
        assert!(ReqwestTransport::new(&config).is_ok());
    }
}
