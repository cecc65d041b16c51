//! Configuration module for Hubwatch
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use hubwatch::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("hubwatch.example.toml")).unwrap();
//! println!("Checking storage every {}s", config.scheduler.check_interval_secs);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FetcherConfig, SchedulerConfig, SiteConfig, StorageConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
