//! Hubwatch main entry point
//!
//! This is the command-line interface for the Hubwatch scraper.

use anyhow::Context;
use clap::Parser;
use hubwatch::config::{load_config_with_hash, Config};
use hubwatch::crawler::{run_session, supervise, ReqwestTransport, TaskKind, TaskScheduler};
use hubwatch::storage::{open_storage, open_storage_read_only, shared, StorageGateway};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Hubwatch: a scheduled hub and article scraper
///
/// Hubwatch periodically fetches every due hub page, records the articles it
/// links to, and extracts date, author and text from each pending article.
#[derive(Parser, Debug)]
#[command(name = "hubwatch")]
#[command(version)]
#[command(about = "A scheduled hub and article scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run a single tick immediately and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    once: bool,

    /// Validate config and show what the next tick would fetch, without fetching
    /// (the database is opened read-only)
    #[arg(long, conflicts_with_all = ["once", "stats"])]
    dry_run: bool,

    /// Show statistics from the database (opened read-only) and exit
    #[arg(long, conflicts_with_all = ["once", "dry_run"])]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.once {
        handle_once(&config).await?;
    } else {
        handle_run(&config).await;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("hubwatch=info,warn"),
            1 => EnvFilter::new("hubwatch=debug,info"),
            2 => EnvFilter::new("hubwatch=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the configuration and the current work lists
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Hubwatch Dry Run ===\n");

    println!("Scheduler:");
    println!("  Check interval: {}s", config.scheduler.check_interval_secs);
    println!("  Restart delay: {}s", config.scheduler.restart_delay_secs);
    let tasks = config
        .scheduler
        .tasks
        .iter()
        .map(|key| TaskKind::resolve(key).map(|kind| kind.key()))
        .collect::<Result<Vec<_>, _>>()?;
    println!("  Tasks: {}", tasks.join(", "));

    println!("\nFetcher:");
    println!("  Concurrency limit: {}", config.fetcher.concurrency_limit);
    if let Some(user_agent) = &config.fetcher.user_agent {
        println!("  User agent: {}", user_agent);
    }
    if let Some(timeout) = config.fetcher.request_timeout_secs {
        println!("  Request timeout: {}s", timeout);
    }

    println!("\nStorage:");
    println!("  Dialect: {}", config.storage.dialect);
    println!("  Database: {}", config.storage.database_path);
    println!("  Site origin: {}", config.site.origin);

    let storage = open_storage_read_only(&config.storage).context("Failed to open storage")?;
    let now = chrono::Utc::now();
    let hubs = storage.get_due_hubs()?;
    let pending = storage.get_pending_articles()?;

    let due: Vec<_> = hubs.values().filter(|hub| hub.is_due(now)).collect();
    println!("\nHubs due now ({} of {} active):", due.len(), hubs.len());
    for hub in due {
        println!("  - {} ({})", hub.name, hub.url);
    }

    println!("\nPending articles ({}):", pending.len());
    for article in pending.values() {
        println!("  - {} ({})", article.header, article.url);
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows row counts from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let storage = open_storage_read_only(&config.storage).context("Failed to open storage")?;
    let stats = storage.stats()?;

    println!("Hubs:             {} ({} active)", stats.hubs, stats.active_hubs);
    println!("Articles:         {}", stats.articles);
    println!("Pending articles: {}", stats.pending_articles);
    println!("Log entries:      {}", stats.log_entries);

    Ok(())
}

/// Handles the --once mode: a single tick with no initial sleep
async fn handle_once(config: &Config) -> anyhow::Result<()> {
    let storage = shared(open_storage(&config.storage).context("Failed to open storage")?);
    let transport = ReqwestTransport::new(&config.fetcher).context("Failed to build HTTP client")?;
    let scheduler = TaskScheduler::new(storage, transport, config)?;

    let report = scheduler.tick().await?;
    println!(
        "Hubs: {} fetched, {} failed, {} new articles",
        report.hubs.processed, report.hubs.failed, report.hubs.inserted
    );
    println!(
        "Articles: {} parsed, {} failed",
        report.articles.processed, report.articles.failed
    );

    Ok(())
}

/// Handles the default mode: the supervised tick loop
async fn handle_run(config: &Config) {
    let restart_delay = Duration::from_secs(config.scheduler.restart_delay_secs);
    supervise(restart_delay, || run_session(config)).await;
    tracing::info!("Hubwatch stopped");
}
