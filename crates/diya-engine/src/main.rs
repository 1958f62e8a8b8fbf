//! # Diya
//!
//! Headless runner for the Diwali greeting page: lights the lamp, runs the
//! firecrackers, confetti and decorations on a virtual clock and writes
//! composed frames as PNG files.
//!
//! Usage:
//! - `diya [CONFIG]`: run with `CONFIG` (defaults to `diya.toml` in the
//!   working directory)
//! - `diya --init [CONFIG]`: write the default configuration and exit

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod config;
mod timing;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::EngineConfig;

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("diya=info".parse()?))
        .init();

    info!("Diya starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args_os().skip(1);
    let mut config = match args.next() {
        Some(flag) if flag == "--init" => {
            let path = args.next().unwrap_or_else(|| config::CONFIG_FILE.into());
            EngineConfig::default().save_to(&path)?;
            return Ok(());
        },
        Some(path) => EngineConfig::load_from(path),
        None => EngineConfig::load(),
    };
    config.validate();

    let summary = app::run(&config)?;
    info!(
        "Wrote {} frames to {}",
        summary.captures.len(),
        config.output_dir.display()
    );
    if summary.dropped > 0 {
        info!("{} particles dropped at the cap", summary.dropped);
    }

    info!("Diya shutdown complete");
    Ok(())
}
