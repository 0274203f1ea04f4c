mod filter;
mod tap;

use filter::suppression::SuppressionFilter;
use frame_tap_common::config::{Config, ConfigError};
use std::io;
use std::path::PathBuf;
use tap::{run_tap, Sink};
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
enum TapError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn main() {
    let config = match load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("frame-tap: {e}");
            std::process::exit(1);
        }
    };

    // stdout carries the echo stream, so logs share stderr with the records.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .with_writer(io::stderr)
        .init();

    info!(
        allowed_prefix = config.filter.allowed_prefix,
        hex_mode = ?config.filter.hex_mode,
        "starting frame-tap"
    );

    if let Err(e) = run(&config) {
        error!(error = %e, "frame-tap stopped");
        std::process::exit(1);
    }
}

/// Config file named by the first argument; built-in defaults without one.
fn load_config() -> Result<Config, TapError> {
    match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => Ok(Config::load(&path)?),
        None => Ok(Config::default()),
    }
}

fn run(config: &Config) -> Result<(), TapError> {
    let mut filter = SuppressionFilter::new(config.filter.allowed_prefix.as_str());
    let mut sink = Sink::new(
        io::stdout().lock(),
        io::stderr().lock(),
        config.output.separator.as_str(),
    );

    let stats = run_tap(
        io::stdin().lock(),
        &mut sink,
        &mut filter,
        config.filter.hex_mode,
    )?;

    info!(
        lines = stats.lines,
        shown = stats.shown,
        hidden = stats.hidden,
        undecodable = stats.undecodable,
        outstanding_tags = filter.suppressed_len(),
        "input closed"
    );
    Ok(())
}
