use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub import: ImportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Batch import limits and CSV dialect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    pub max_batch_size: usize,
    pub csv_delimiter: String,
}

impl ImportConfig {
    /// First byte of the configured delimiter, `,` when unset.
    pub fn delimiter(&self) -> u8 {
        self.csv_delimiter.bytes().next().unwrap_or(b',')
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 5000,
            csv_delimiter: ",".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `RATEIO_`-prefixed environment variables,
    /// e.g. `RATEIO_SERVER__PORT=9000` or `RATEIO_IMPORT__CSV_DELIMITER=;`.
    pub fn load() -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        config::Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("import.max_batch_size", defaults.import.max_batch_size as i64)?
            .set_default("import.csv_delimiter", defaults.import.csv_delimiter)?
            .add_source(
                config::Environment::with_prefix("RATEIO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_environment() {
        let config = AppConfig::load().unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.import.max_batch_size, 5000);
        assert_eq!(config.import.delimiter(), b',');
    }

    #[test]
    fn delimiter_falls_back_to_comma() {
        let config = ImportConfig {
            csv_delimiter: String::new(),
            ..ImportConfig::default()
        };
        assert_eq!(config.delimiter(), b',');

        let semicolon = ImportConfig {
            csv_delimiter: ";".into(),
            ..ImportConfig::default()
        };
        assert_eq!(semicolon.delimiter(), b';');
    }
}
