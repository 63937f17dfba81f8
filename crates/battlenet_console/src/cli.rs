//! Command-line argument parsing for the console observer.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments.
///
/// Arguments override the corresponding configuration file settings.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path.
    ///
    /// If the file doesn't exist, a default configuration is created there.
    #[arg(short, long, default_value = "battlenet.toml")]
    pub config: PathBuf,

    /// Server websocket URL, overriding the configuration file.
    #[arg(short, long)]
    pub url: Option<String>,

    /// Games descriptor file (JSON array), overriding the configuration file.
    ///
    /// Stands in for the games-list REST endpoint.
    #[arg(short, long)]
    pub games: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long)]
    pub debug: bool,

    /// A command to emit once connected (e.g. "leaveRoom").
    #[arg(long)]
    pub emit: Option<String>,

    /// JSON payload for --emit.
    #[arg(long, requires = "emit")]
    pub options: Option<String>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            config: PathBuf::from("battlenet.toml"),
            url: None,
            games: None,
            debug: false,
            emit: None,
            options: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_default() {
        let args = Args::default();
        assert_eq!(args.config, PathBuf::from("battlenet.toml"));
        assert!(!args.debug);
        assert!(args.url.is_none());
        assert!(args.games.is_none());
        assert!(args.emit.is_none());
    }
}
