use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Main configuration for the publisher service
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,
    /// Publication settings
    #[serde(default)]
    pub publisher: PublisherConfig,
    /// Object storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Index database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// HTTP API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Service name for logging/metrics
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Metrics port
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

/// Which adapters back the publisher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// S3-compatible storage plus Postgres index
    #[default]
    Supabase,
    /// Process memory, nothing leaves the service
    Memory,
}

/// Publication settings
#[derive(Debug, Clone, Deserialize)]
pub struct PublisherConfig {
    /// Destination bucket
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Total upload attempts on transient failures (floored to 1)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Adapters to wire at startup
    #[serde(default)]
    pub backend: Backend,
}

/// S3-compatible storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Region sent to the S3 endpoint
    #[serde(default = "default_region")]
    pub region: String,
    /// Endpoint URL (Supabase S3 gateway, MinIO, LocalStack, ...)
    pub endpoint_url: Option<String>,
    /// Force path-style access
    #[serde(default = "default_true")]
    pub force_path_style: bool,
    /// Static access key; falls back to the default AWS credential chain
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Cache-Control header set on uploaded objects
    #[serde(default = "default_cache_control")]
    pub cache_control: String,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    #[serde(default)]
    pub url: String,
    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Idle connection timeout in seconds
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// Run migrations on startup
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// API listen address
    #[serde(default = "default_api_host")]
    pub host: String,
    /// API listen port
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    /// Allowed CORS origins
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

// Default value functions
fn default_service_name() -> String {
    "shots-publisher".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_bucket() -> String {
    crate::publisher::DEFAULT_BUCKET.to_string()
}

fn default_max_attempts() -> u32 {
    crate::publisher::DEFAULT_MAX_ATTEMPTS
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_cache_control() -> String {
    "max-age=31536000".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_idle_timeout_secs() -> u64 {
    600
}

fn default_true() -> bool {
    true
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8080
}

impl Config {
    /// Load configuration from config files and environment
    pub fn load() -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/publisher").required(false))
            .add_source(config::File::with_name("/etc/shots/publisher").required(false))
            // PUBLISHER__STORAGE__ENDPOINT_URL -> storage.endpoint_url
            .add_source(
                config::Environment::with_prefix("PUBLISHER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field requirements the deserializer cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.publisher.bucket.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "publisher.bucket".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        if self.publisher.backend == Backend::Supabase {
            if self.database.url.is_empty() {
                return Err(ConfigError::MissingRequired("database.url".to_string()));
            }
            if self.storage.endpoint_url.is_none() {
                return Err(ConfigError::MissingRequired(
                    "storage.endpoint_url".to_string(),
                ));
            }
            if self.storage.access_key_id.is_some() != self.storage.secret_access_key.is_some() {
                return Err(ConfigError::InvalidValue {
                    key: "storage.access_key_id".to_string(),
                    message: "access key id and secret must be set together".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
            metrics_port: default_metrics_port(),
        }
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            max_attempts: default_max_attempts(),
            backend: Backend::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint_url: None,
            force_path_style: true,
            access_key_id: None,
            secret_access_key: None,
            cache_control: default_cache_control(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            run_migrations: true,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}
