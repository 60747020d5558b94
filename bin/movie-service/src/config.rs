//! Movie service configuration
//!
//! Loaded from the YAML file named by `MOVIE_CONFIG` when set, otherwise
//! defaults. `MOVIE_PORT` overrides the API port either way.

use anyhow::{Context, Result};
use discovery_core::RegistryConfig;
use discovery_gateway::{GatewayConfig, LimiterConfig};
use serde::Deserialize;
use std::path::Path;

const CONFIG_PATH_ENV: &str = "MOVIE_CONFIG";
const PORT_ENV: &str = "MOVIE_PORT";

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub api: ApiConfig,
    pub registry: RegistryConfig,
    pub gateway: GatewayConfig,
    pub limiter: LimiterConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Host other services should dial to reach this instance
    pub host: String,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8083,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };

        if let Ok(port) = std::env::var(PORT_ENV) {
            config.api.port = port
                .parse()
                .with_context(|| format!("Invalid {}: {}", PORT_ENV, port))?;
        }

        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open configuration {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse configuration {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.registry.validate()?;
        Ok(config)
    }

    /// Address this instance registers under
    pub fn advertised_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
