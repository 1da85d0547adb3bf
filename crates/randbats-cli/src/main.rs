//! randbats - offline Pokemon random battle sets.
//!
//! Serves set data from a local cache, refreshed from the pkmn/randbats
//! repository when it goes stale.

mod cli;
mod commands;
mod display;

use std::io;
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;
use randbats_core::Config;

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set. The returned guard flushes the log file and
/// must live until exit.
fn init_tracing(verbose: bool, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "randbats.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = init_tracing(cli.verbose, cli.log_file.as_deref());
    info!("randbats starting");

    let mut config = Config::load()?;
    if let Some(dir) = cli.cache_dir {
        config.cache_dir = Some(dir);
    }
    if cli.offline {
        config.auto_update = false;
    }
    debug!(?config, "Effective configuration");

    commands::run(cli.command, config, cli.offline).await
}
