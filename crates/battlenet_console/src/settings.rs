//! Configuration file handling for the console observer.

use crate::cli::Args;
use anyhow::Result;
use battlenet_client::ClientConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Root configuration, persisted as TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Client connection and stream settings.
    #[serde(flatten)]
    pub client: ClientConfig,
    /// Where the games descriptor list lives.
    pub games: GamesSettings,
    /// Optional logging configuration.
    pub logging: Option<LoggingSettings>,
}

/// Source of the game descriptors.
///
/// The real application receives these from a REST endpoint; the console
/// reads them from a local JSON file with the same shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamesSettings {
    /// Path to a JSON array of game descriptors.
    pub file: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Level filter: "trace", "debug", "info", "warn", or "error".
    pub level: String,
    /// Emit structured JSON logs instead of human-readable output.
    pub json_format: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            games: GamesSettings {
                file: "games.json".to_string(),
            },
            logging: Some(LoggingSettings {
                level: "info".to_string(),
                json_format: false,
            }),
        }
    }
}

/// Load configuration from file or create a default configuration file.
pub async fn load_config(args: &Args) -> Result<Config> {
    if args.config.exists() {
        let config_str = tokio::fs::read_to_string(&args.config).await?;
        match toml::de::from_str::<Config>(&config_str) {
            Ok(config) => Ok(config),
            Err(e) => {
                warn!("Failed to parse config file {}: {}", args.config.display(), e);
                Err(e.into())
            }
        }
    } else {
        warn!(
            "Configuration file not found: {}, using defaults",
            args.config.display()
        );

        let default_config = Config::default();
        let config_str = toml::to_string_pretty(&default_config)?;
        tokio::fs::write(&args.config, config_str).await?;
        info!("Created default configuration file: {}", args.config.display());

        Ok(default_config)
    }
}
