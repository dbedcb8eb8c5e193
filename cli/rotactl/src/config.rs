//! Run configuration.
//!
//! Every setting comes from the environment first and can be overridden by
//! the matching command-line flag.

use std::path::PathBuf;

use anyhow::{Context, Result};
use rota_allocation::DEFAULT_MAX_ATTEMPTS;

/// CLI configuration (env-driven).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Workbook files to process, one per line in `ROTA_WORKBOOKS`.
    pub workbooks: Vec<PathBuf>,

    /// Amend the current column instead of starting a new one.
    pub manual: bool,

    /// Base seed for the random allocators.
    pub seed: Option<u64>,

    /// Attempts the segregated allocator may run.
    pub max_attempts: usize,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of text.
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let workbooks = lookup("ROTA_WORKBOOKS")
            .map(|value| {
                value
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(PathBuf::from)
                    .collect()
            })
            .unwrap_or_default();

        let manual = lookup("MANUAL_RUN").is_some_and(|v| parse_flag(&v));

        let seed = lookup("ROTA_SEED")
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim().parse())
            .transpose()
            .context("ROTA_SEED must be an unsigned integer.")?;

        let max_attempts: usize = lookup("ROTA_MAX_ATTEMPTS")
            .map(|v| v.trim().parse())
            .transpose()
            .context("ROTA_MAX_ATTEMPTS must be an integer.")?
            .unwrap_or(DEFAULT_MAX_ATTEMPTS)
            .max(1);

        let log_level = lookup("ROTA_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let log_json = lookup("ROTA_LOG_JSON").is_some_and(|v| parse_flag(&v));

        Ok(Self {
            workbooks,
            manual,
            seed,
            max_attempts,
            log_level,
            log_json,
        })
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}
