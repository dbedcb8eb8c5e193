//! rotactl (rota) - CLI for code review rotations
//!
//! Runs the allocation engines over one or more rotation workbooks and
//! writes the results back as dated columns.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod error;
mod output;

use commands::{Cli, EXIT_TOTAL_FAILURE};
use config::Config;

fn main() {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error::print_error(&e);
            std::process::exit(EXIT_TOTAL_FAILURE);
        }
    };

    init_tracing(&config);

    match cli.run(config) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error::print_error(&e);
            std::process::exit(EXIT_TOTAL_FAILURE);
        }
    }
}

/// Initialize tracing (prefer RUST_LOG, fallback to ROTA_LOG_LEVEL). Logs go
/// to stderr so stdout carries only command output.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into());
    let registry = tracing_subscriber::registry().with(filter);

    if config.log_json {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr);
        registry.with(layer).init();
    } else {
        let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        registry.with(layer).init();
    }
}
