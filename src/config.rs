use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub database: DatabaseConfig,

    pub cache: CacheConfig,

    pub storage: StorageConfig,

    pub geoapify: GeoapifyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            worker_threads: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Postgres connection string. The database needs the PostGIS extension
    /// available; migrations enable it.
    pub url: String,

    pub max_connections: u32,

    pub min_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/homeward".to_string(),
            max_connections: 5,
            min_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    /// Upstash Redis REST endpoint.
    pub url: String,

    #[serde(skip_serializing)]
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Supabase project base URL.
    pub url: String,

    #[serde(skip_serializing)]
    pub api_key: String,

    pub bucket: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            bucket: crate::constants::photos::STORAGE_BUCKET.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoapifyConfig {
    pub base_url: String,

    pub ipinfo_path: String,

    #[serde(skip_serializing)]
    pub api_key: String,
}

impl Default for GeoapifyConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.geoapify.com".to_string(),
            ipinfo_path: "/v1/ipinfo".to_string(),
            api_key: String::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            cache: CacheConfig::default(),
            storage: StorageConfig::default(),
            geoapify: GeoapifyConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        let mut loaded = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                loaded = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = loaded.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("homeward").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".homeward").join("config.toml"));
        }

        paths
    }

    /// Secrets come from the environment when set, so the TOML file can be
    /// committed without credentials.
    fn apply_env_overrides(&mut self) {
        let overrides: [(&str, &mut String); 6] = [
            ("DATABASE_URL", &mut self.database.url),
            ("UPSTASH_REDIS_REST_URL", &mut self.cache.url),
            ("UPSTASH_REDIS_REST_TOKEN", &mut self.cache.token),
            ("SUPABASE_URL", &mut self.storage.url),
            ("SUPABASE_SERVICE_ROLE_KEY", &mut self.storage.api_key),
            ("GEOAPIFY_API_KEY", &mut self.geoapify.api_key),
        ];
        for (var, target) in overrides {
            if let Ok(value) = std::env::var(var)
                && !value.is_empty()
            {
                *target = value;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }
        if self.database.max_connections == 0 {
            anyhow::bail!("Database pool must allow at least one connection");
        }
        if self.cache.url.is_empty() || self.cache.token.is_empty() {
            anyhow::bail!("Cache URL and token must be configured");
        }
        if self.storage.url.is_empty() || self.storage.api_key.is_empty() {
            anyhow::bail!("Storage URL and API key must be configured");
        }
        if self.storage.bucket.is_empty() {
            anyhow::bail!("Storage bucket cannot be empty");
        }
        if self.geoapify.api_key.is_empty() {
            anyhow::bail!("Geoapify API key must be configured");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.storage.bucket, "animals");
        assert_eq!(config.geoapify.base_url, "https://api.geoapify.com");
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[database]"));
        assert!(toml_str.contains("[geoapify]"));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 8080
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_validate_rejects_missing_secrets() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }
}
