//! API configuration

use serde::Deserialize;

use core_kernel::Currency;

/// API configuration
///
/// Loaded from `APP_`-prefixed environment variables, e.g. `APP_PORT=9090`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL
    pub database_url: String,
    /// Log level
    pub log_level: String,
    /// Maximum pooled database connections
    pub max_connections: u32,
    /// Currency whose minor unit amounts are rounded to
    pub base_currency: Currency,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "postgres://localhost/manufacturing".to_string(),
            log_level: "info".to_string(),
            max_connections: 10,
            base_currency: Currency::USD,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("APP"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_server_addr() {
        let config = ApiConfig::default();
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert_eq!(config.base_currency, Currency::USD);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ApiConfig = config::Config::builder()
            .set_override("port", 9090)
            .and_then(|builder| builder.set_override("base_currency", "EUR"))
            .and_then(|builder| builder.build())
            .and_then(|config| config.try_deserialize())
            .unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.base_currency, Currency::EUR);
        assert_eq!(config.host, "0.0.0.0");
    }
}
