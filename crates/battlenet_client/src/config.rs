//! Client configuration structures.
//!
//! Serializable to/from TOML so binaries can keep them in a config file.

use serde::{Deserialize, Serialize};

/// Root client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Transport connection settings.
    pub connection: ConnectionSettings,
    /// Output stream settings.
    pub streams: StreamSettings,
}

/// Settings for the websocket connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Server websocket URL, e.g. `ws://127.0.0.1:3030/ws`.
    pub url: String,
}

/// Settings for the typed output streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamSettings {
    /// Per-subscriber buffer: how many unconsumed values a subscriber can
    /// fall behind before it starts lagging.
    pub capacity: usize,
}

impl Default for ClientConfig {
    /// Defaults that work against a local development server.
    fn default() -> Self {
        Self {
            connection: ConnectionSettings {
                url: "ws://127.0.0.1:3030/ws".to_string(),
            },
            streams: StreamSettings { capacity: 256 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.connection.url, "ws://127.0.0.1:3030/ws");
        assert_eq!(config.streams.capacity, 256);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = ClientConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: ClientConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.connection.url, deserialized.connection.url);
        assert_eq!(config.streams.capacity, deserialized.streams.capacity);
    }

    #[test]
    fn toml_parsing() {
        let toml_str = r#"
[connection]
url = "ws://battles.example:3030/ws"

[streams]
capacity = 64
        "#;

        let config: ClientConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.connection.url, "ws://battles.example:3030/ws");
        assert_eq!(config.streams.capacity, 64);
    }
}
