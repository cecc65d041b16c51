//! Integration tests for the tick loop
//!
//! These tests use wiremock to stand in for the scraped site and run whole
//! ticks against a file-backed SQLite database.

use chrono::{DateTime, TimeZone, Utc};
use hubwatch::config::{parse_config, Config};
use hubwatch::crawler::{ReqwestTransport, TaskScheduler, Transport};
use hubwatch::storage::{open_storage, shared, SqliteStorage, StorageGateway, Table};
use hubwatch::ParseStatus;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HUB_PATH: &str = "/ru/hubs/rust/articles/";

const ARTICLE_PAGE: &str = r#"<html><body>
    <span class="tm-user-info tm-article-snippet__author">
      <a href="/ru/users/ferris/" class="tm-user-info__username">ferris</a>
    </span>
    <span class="tm-article-datetime-published">
      <time datetime="2024-02-28T09:15:30.000Z">28 Feb</time>
    </span>
    <div id="post-content-body">
      <div xmlns="http://www.w3.org/1999/xhtml"><h2>Intro</h2><p>Body text.</p></div>
    </div>
</body></html>"#;

fn hub_page(count: usize) -> String {
    let headings: String = (1..=count)
        .map(|n| {
            format!(
                r#"<h2 class="tm-title tm-title_h2"><a href="/ru/articles/{n}/" class="tm-title__link"><span>Article {n}</span></a></h2>"#
            )
        })
        .collect();

    format!("<html><body>{}</body></html>", headings)
}

/// Creates a test configuration pointing at the mock site and a temp database
fn create_test_config(origin: &str, dir: &TempDir) -> Config {
    let db_path = dir.path().join("hubwatch.db");

    parse_config(&format!(
        r#"
[scheduler]
check-interval-secs = 1
tasks = ["hubs", "articles"]

[fetcher]
concurrency-limit = 2
request-timeout-secs = 5

[storage]
dialect = "sqlite"
database-path = "{}"

[site]
origin = "{}"
"#,
        db_path.display(),
        origin
    ))
    .expect("Failed to parse test config")
}

fn tick_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

/// Seeds one active hub (10 minute interval, never parsed)
fn seed_hub(storage: &mut SqliteStorage, base_url: &str) -> i64 {
    storage
        .insert(
            Table::Hubs,
            &[
                ("name", "rust".into()),
                ("url", format!("{}{}", base_url, HUB_PATH).into()),
                ("parse_interval_minutes", 10i64.into()),
                ("is_active", true.into()),
            ],
        )
        .expect("Failed to seed hub");

    storage.get_hub("rust").unwrap().unwrap().id
}

fn seed_article(storage: &mut SqliteStorage, hub_id: i64, header: &str, url: &str) {
    storage
        .insert(
            Table::Articles,
            &[
                ("habr_id", hub_id.into()),
                ("url", url.into()),
                ("header", header.into()),
                ("parse_this", true.into()),
            ],
        )
        .expect("Failed to seed article");
}

async fn mount_page(server: &MockServer, page_path: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn scheduler_for(
    config: &Config,
    storage: SqliteStorage,
) -> TaskScheduler<SqliteStorage, ReqwestTransport> {
    let transport = ReqwestTransport::new(&config.fetcher).expect("Failed to build client");
    TaskScheduler::new(shared(storage), transport, config).expect("Failed to create scheduler")
}

#[tokio::test]
async fn test_full_tick() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, &dir);

    mount_page(&server, HUB_PATH, 200, &hub_page(3)).await;
    mount_page(&server, "/ru/articles/100/", 200, ARTICLE_PAGE).await;

    let mut storage = open_storage(&config.storage).unwrap();
    let hub_id = seed_hub(&mut storage, &base_url);
    let old_url = format!("{}/ru/articles/100/", base_url);
    seed_article(&mut storage, hub_id, "Old article", &old_url);

    let scheduler = scheduler_for(&config, storage);
    let report = scheduler.tick_at(tick_time()).await.expect("Tick failed");

    assert_eq!(report.hubs.processed, 1);
    assert_eq!(report.hubs.discovered, 3);
    assert_eq!(report.hubs.inserted, 3);
    assert_eq!(report.articles.processed, 1);

    let storage = scheduler.storage().lock().unwrap();

    let hub = storage.get_hub("rust").unwrap().unwrap();
    assert_eq!(hub.last_parsed, Some(tick_time()));
    assert_eq!(hub.last_status, Some(ParseStatus::Success));

    let old = storage.get_article("Old article").unwrap().unwrap();
    assert!(!old.pending);
    assert_eq!(old.date_parsed, Some(tick_time()));
    assert_eq!(old.author_name.as_deref(), Some("ferris"));
    assert_eq!(
        old.author_url,
        Some(format!("{}/ru/users/ferris/", base_url))
    );
    assert_eq!(old.article_text.as_deref(), Some("Intro\nBody text."));
    assert_eq!(
        old.article_date,
        Some(Utc.with_ymd_and_hms(2024, 2, 28, 9, 15, 30).unwrap())
    );

    // Discovered this tick, fetched on the next
    let pending = storage.get_pending_articles().unwrap();
    assert_eq!(pending.len(), 3);
    let first = &pending["Article 1"];
    assert_eq!(first.url, format!("{}/ru/articles/1/", base_url));
    assert_eq!(first.hub_id, hub_id);
    let discovered = storage.get_article("Article 1").unwrap().unwrap();
    assert_eq!(discovered.date_collected, Some(tick_time()));

    let logs = storage.list_logs().unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].parser_name, "Hubs parser");
    assert_eq!(
        logs[0].log_text,
        format!("URL {}{} was successfully fetched!", base_url, HUB_PATH)
    );
    assert_eq!(logs[1].parser_name, "Articles parser");
}

#[tokio::test]
async fn test_discovered_articles_parsed_on_next_tick() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, &dir);

    mount_page(&server, HUB_PATH, 200, &hub_page(4)).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/ru/articles/\d+/$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ARTICLE_PAGE))
        .mount(&server)
        .await;

    let mut storage = open_storage(&config.storage).unwrap();
    seed_hub(&mut storage, &base_url);

    let scheduler = scheduler_for(&config, storage);
    scheduler.tick_at(tick_time()).await.unwrap();

    let second = scheduler
        .tick_at(tick_time() + chrono::Duration::minutes(1))
        .await
        .unwrap();

    // Hub is not due again for another nine minutes
    assert_eq!(second.skipped_hubs, 1);
    assert_eq!(second.hubs.processed, 0);
    assert_eq!(second.articles.processed, 4);

    let storage = scheduler.storage().lock().unwrap();
    assert!(storage.get_pending_articles().unwrap().is_empty());
    let stats = storage.stats().unwrap();
    assert_eq!(stats.articles, 4);
    assert_eq!(stats.pending_articles, 0);
}

#[tokio::test]
async fn test_hub_reingestion_adds_no_duplicates() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, &dir);

    mount_page(&server, HUB_PATH, 200, &hub_page(2)).await;

    let mut storage = open_storage(&config.storage).unwrap();
    seed_hub(&mut storage, &base_url);

    let mut config = config;
    config.scheduler.tasks = vec!["hubs".to_string()];
    let scheduler = scheduler_for(&config, storage);

    let first = scheduler.tick_at(tick_time()).await.unwrap();
    let later = tick_time() + chrono::Duration::minutes(10);
    let second = scheduler.tick_at(later).await.unwrap();

    assert_eq!(first.hubs.inserted, 2);
    assert_eq!(second.hubs.discovered, 2);
    assert_eq!(second.hubs.inserted, 0);

    let storage = scheduler.storage().lock().unwrap();
    assert_eq!(storage.stats().unwrap().articles, 2);
    assert_eq!(
        storage.get_hub("rust").unwrap().unwrap().last_parsed,
        Some(later)
    );
}

#[tokio::test]
async fn test_missing_article_stays_pending() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, &dir);

    mount_page(&server, "/ru/articles/404/", 404, "gone").await;

    let mut storage = open_storage(&config.storage).unwrap();
    let hub_id = seed_hub(&mut storage, &base_url);
    storage
        .update(
            Table::Hubs,
            &[("id", hub_id.into())],
            &[("is_active", false.into())],
        )
        .unwrap();
    let url = format!("{}/ru/articles/404/", base_url);
    seed_article(&mut storage, hub_id, "Gone article", &url);

    let scheduler = scheduler_for(&config, storage);
    let report = scheduler.tick_at(tick_time()).await.unwrap();

    assert_eq!(report.hubs.processed, 0);
    assert_eq!(report.articles.failed, 1);

    let storage = scheduler.storage().lock().unwrap();
    let article = storage.get_article("Gone article").unwrap().unwrap();
    assert!(article.pending);
    assert_eq!(article.date_parsed, None);

    let logs = storage.list_logs().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].parser_name, "Articles parser");
    assert!(logs[0].log_text.starts_with(&format!("Failed to fetch url {}", url)));
}

#[tokio::test]
async fn test_state_survives_reopen() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, &dir);

    mount_page(&server, HUB_PATH, 200, &hub_page(1)).await;

    let mut storage = open_storage(&config.storage).unwrap();
    seed_hub(&mut storage, &base_url);
    let scheduler = scheduler_for(&config, storage);
    scheduler.tick_at(tick_time()).await.unwrap();
    drop(scheduler);

    let reopened = open_storage(&config.storage).unwrap();
    let hub = reopened.get_hub("rust").unwrap().unwrap();
    assert_eq!(hub.last_parsed, Some(tick_time()));
    assert!(!hub.is_due(tick_time() + chrono::Duration::minutes(9)));
    assert_eq!(reopened.get_pending_articles().unwrap().len(), 1);
}

#[tokio::test]
async fn test_reqwest_transport() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, &dir);

    mount_page(&server, "/ok", 200, "<html>hello</html>").await;
    mount_page(&server, "/missing", 404, "not here").await;

    let transport = ReqwestTransport::new(&config.fetcher).unwrap();

    let ok = transport.get(&format!("{}/ok", base_url)).await.unwrap();
    assert_eq!(ok.status, 200);
    assert_eq!(ok.body, "<html>hello</html>");

    let missing = transport.get(&format!("{}/missing", base_url)).await.unwrap();
    assert_eq!(missing.status, 404);
    assert!(missing.body.is_empty());

    assert!(transport.get("http://127.0.0.1:1/").await.is_err());
}
