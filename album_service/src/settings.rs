//! Configuration management with environment variable support and validation.

use anyhow::{anyhow, Result};
use config::{Config, Environment};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tracing::warn;

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_request_size_mb: usize,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_request_size_mb: 1,
            enable_cors: false,
            cors_origins: vec![],
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Which persistence backend the record store uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    Blob,
}

/// Record storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub bucket: Option<String>,
    pub region: Option<String>,
    /// Custom S3-compatible endpoint (MinIO, LocalStack, ...)
    pub endpoint: Option<String>,
    pub allow_http: bool,
}

/// Chat proxy configuration. Model and sampling parameters are fixed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub api_key: Option<String>,
}

/// Main settings structure with all configuration sections
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub chat: ChatConfig,
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            // Start with default settings
            .add_source(config::File::from_str(
                include_str!("../config.toml"),
                config::FileFormat::Toml,
            ))
            // Add local config file if it exists
            .add_source(config::File::with_name("config").required(false))
            // Add environment variables with ALBUMS_ prefix
            .add_source(
                Environment::with_prefix("ALBUMS")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;

        Self::apply_env_overrides(&mut settings)?;

        Ok(settings)
    }

    /// Apply overrides from the conventional deployment variables
    fn apply_env_overrides(settings: &mut Settings) -> Result<()> {
        if let Ok(host) = std::env::var("ALBUMS_SERVER_HOST") {
            settings.server.host = host;
        }
        if let Ok(port) = std::env::var("ALBUMS_SERVER_PORT") {
            settings.server.port = port.parse()?;
        }

        // A bucket name implies blob storage
        if let Ok(bucket) = std::env::var("S3_BUCKET_NAME") {
            if !bucket.is_empty() {
                settings.storage.bucket = Some(bucket);
                settings.storage.backend = StorageBackend::Blob;
            }
        }

        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            if !api_key.is_empty() {
                settings.chat.api_key = Some(api_key);
            }
        }

        Ok(())
    }

    /// Apply `serve` command-line flags over the loaded settings
    pub fn apply_serve_overrides(
        &mut self,
        addr: Option<SocketAddr>,
        backend: Option<StorageBackend>,
    ) {
        if let Some(addr) = addr {
            self.server.host = addr.ip().to_string();
            self.server.port = addr.port();
        }
        if let Some(backend) = backend {
            self.storage.backend = backend;
        }
    }

    /// Validate settings for consistency
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow!("Server port cannot be 0"));
        }
        if self.server.max_request_size_mb == 0 {
            return Err(anyhow!("Max request size cannot be 0"));
        }

        match self.logging.format.as_str() {
            "text" | "json" => {}
            other => return Err(anyhow!("Unknown log format: {}", other)),
        }

        if self.storage.backend == StorageBackend::Blob
            && self.storage.bucket.as_deref().map_or(true, str::is_empty)
        {
            return Err(anyhow!("Blob storage requires S3_BUCKET_NAME or storage.bucket"));
        }

        if self.chat.api_key.is_none() {
            warn!("No chat API key configured; /chatgpt requests will fail upstream");
        }

        Ok(())
    }

    /// Copy of the settings that is safe to print
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.chat.api_key.is_some() {
            copy.chat.api_key = Some("********".to_string());
        }
        copy
    }
}
