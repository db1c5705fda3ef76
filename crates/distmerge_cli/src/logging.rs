//! Console logging for the `distmerge` command.
//!
//! Progress lines come from `tracing` events in `distmerge_io_fs`. `RUST_LOG`
//! overrides the level picked from `-v` flags.

use std::env;

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Minimum level when `RUST_LOG` is unset.
    pub level: Level,
    /// JSON lines instead of plain text.
    pub use_json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
        }
    }
}

impl LoggingConfig {
    pub fn from_verbosity(verbose: u8, use_json: bool) -> Self {
        Self {
            level: level_from_verbosity(verbose),
            use_json,
        }
    }
}

pub fn level_from_verbosity(verbose: u8) -> Level {
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    match env::var("RUST_LOG") {
        Ok(c_directives) if !c_directives.trim().is_empty() => EnvFilter::new(c_directives),
        _ => EnvFilter::new(config.level.as_str().to_lowercase()),
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config);

    if config.use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(false))
            .try_init()
            .context("failed to install JSON log subscriber")
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).without_time())
            .try_init()
            .context("failed to install log subscriber")
    }
}
