//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `DATABASE_MAX_CONNECTIONS` (optional): pool size, defaults to 5
/// - `CORS_ALLOWED_ORIGIN` (optional): origin of the web UI; any origin is allowed when unset
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    #[serde(default)]
    pub cors_allowed_origin: Option<String>,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_max_connections() -> u32 {
    5
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        // Field names are automatically converted: database_url -> DATABASE_URL
        envy::from_env::<Config>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_defaults() {
        let vars = vec![(
            "DATABASE_URL".to_string(),
            "postgres://localhost/studio".to_string(),
        )];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.database_max_connections, 5);
        assert!(config.cors_allowed_origin.is_none());
    }

    #[test]
    fn reads_overrides() {
        let vars = vec![
            ("DATABASE_URL".to_string(), "postgres://db/studio".to_string()),
            ("SERVER_PORT".to_string(), "8080".to_string()),
            ("DATABASE_MAX_CONNECTIONS".to_string(), "20".to_string()),
            (
                "CORS_ALLOWED_ORIGIN".to_string(),
                "https://app.example.com".to_string(),
            ),
        ];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.server_port, 8080);
        assert_eq!(config.database_max_connections, 20);
        assert_eq!(
            config.cors_allowed_origin.as_deref(),
            Some("https://app.example.com")
        );
    }

    #[test]
    fn requires_database_url() {
        let vars: Vec<(String, String)> = vec![];
        assert!(envy::from_iter::<_, Config>(vars).is_err());
    }
}
