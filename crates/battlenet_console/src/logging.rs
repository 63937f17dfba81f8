//! Logging system setup.
//!
//! Structured logging via tracing, with the level taken from the `--debug`
//! flag or the configuration file and overridable through `RUST_LOG`.

use crate::settings::LoggingSettings;
use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging system.
///
/// Level precedence: `RUST_LOG` environment variable, then the configuration
/// file's `[logging]` section, then `--debug`/default.
pub fn setup_logging(debug: bool, settings: Option<&LoggingSettings>) -> Result<()> {
    let level = match settings {
        _ if debug => "debug",
        Some(settings) => settings.level.as_str(),
        None => "info",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let json_format = settings.map(|s| s.json_format).unwrap_or(false);
    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .init();
    }

    Ok(())
}
