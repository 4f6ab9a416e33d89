//! Logging
//!
//! tracing initialization: console output by default, plus a daily rolling
//! file under `~/.zapgate/logs/` in debug mode.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Logging setup options.
pub struct LogConfig {
    debug: bool,
    log_dir: PathBuf,
}

impl LogConfig {
    pub fn new() -> Self {
        Self {
            debug: false,
            log_dir: crate::config::zapgate_home().join("logs"),
        }
    }

    pub fn with_debug_mode(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_log_dir(mut self, dir: PathBuf) -> Self {
        self.log_dir = dir;
        self
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Initialize the global subscriber. In debug mode, returns the appender
/// guard that must be held for the life of the process.
pub fn init_logging(config: LogConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if config.debug {
            "zapgate=debug,info"
        } else {
            "zapgate=info,warn"
        })
    });

    if config.debug {
        std::fs::create_dir_all(&config.log_dir)
            .with_context(|| format!("creating log dir {}", config.log_dir.display()))?;
        let appender = tracing_appender::rolling::daily(&config.log_dir, "zapgate.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
        Ok(Some(guard))
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(None)
    }
}
