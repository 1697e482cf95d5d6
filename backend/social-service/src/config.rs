/// Configuration management for Social Service
///
/// Loads configuration from environment variables (a `.env` file is read first
/// when present).
use anyhow::{bail, Context, Result};
use db_pool::env_utils::{parse_env_list, parse_env_optional, parse_env_with_default};
use db_pool::DbConfig;
use std::time::Duration;

pub const SERVICE_NAME: &str = "social-service";

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    /// Pool settings; only read from the environment for the Postgres backend
    pub database: DbConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub http_port: u16,
    /// Allowed browser origins; cookies are sent cross-origin only to these
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    /// Session cookies carry `Secure` everywhere except development
    pub fn secure_cookies(&self) -> bool {
        self.env != "development"
    }
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_token_secret", &"[REDACTED]")
            .field("refresh_token_secret", &"[REDACTED]")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .finish()
    }
}

/// Image store credentials; all three must be present for uploads to work
#[derive(Clone)]
pub struct MediaConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub max_upload_bytes: usize,
}

impl std::fmt::Debug for MediaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_secret", &self.api_secret.as_ref().map(|_| "[REDACTED]"))
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Per-attempt timeout for store calls
    pub timeout: Duration,
    /// Retries on transient store errors (0 disables retry)
    pub max_retries: u32,
}

const DEFAULT_HTTP_PORT: u16 = 9000;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: parse_env_with_default("PORT", DEFAULT_HTTP_PORT),
            cors_origins: parse_env_list("CORS_ORIGINS", "http://localhost:5173"),
        };

        let backend = match std::env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            other => bail!("STORE_BACKEND must be 'postgres' or 'memory', got '{}'", other),
        };

        let store = StoreConfig {
            backend,
            timeout: Duration::from_millis(parse_env_with_default("STORE_TIMEOUT_MS", 5000)),
            max_retries: parse_env_with_default("STORE_MAX_RETRIES", 2),
        };

        // The in-memory backend needs neither PostgreSQL nor Redis
        let database = match backend {
            StoreBackend::Postgres => {
                DbConfig::from_env(SERVICE_NAME).map_err(anyhow::Error::msg)?
            }
            StoreBackend::Memory => DbConfig {
                service_name: SERVICE_NAME.to_string(),
                ..DbConfig::default()
            },
        };

        let redis = RedisConfig {
            url: match backend {
                StoreBackend::Postgres => {
                    std::env::var("REDIS_URL").context("REDIS_URL environment variable not set")?
                }
                StoreBackend::Memory => std::env::var("REDIS_URL").unwrap_or_default(),
            },
        };

        let auth = AuthConfig {
            access_token_secret: std::env::var("ACCESS_TOKEN_SECRET")
                .context("ACCESS_TOKEN_SECRET environment variable not set")?,
            refresh_token_secret: std::env::var("REFRESH_TOKEN_SECRET")
                .context("REFRESH_TOKEN_SECRET environment variable not set")?,
            access_token_ttl_secs: parse_env_with_default("ACCESS_TOKEN_TTL_SECS", 15 * 60),
            refresh_token_ttl_secs: parse_env_with_default(
                "REFRESH_TOKEN_TTL_SECS",
                7 * 24 * 60 * 60,
            ),
        };
        if auth.access_token_secret == auth.refresh_token_secret {
            bail!("ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ");
        }

        let media = MediaConfig {
            cloud_name: non_empty_env("CLOUDINARY_CLOUD_NAME"),
            api_key: non_empty_env("CLOUDINARY_API_KEY"),
            api_secret: non_empty_env("CLOUDINARY_API_SECRET"),
            max_upload_bytes: parse_env_optional("MAX_UPLOAD_BYTES")
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        };

        Ok(Config {
            app,
            database,
            redis,
            auth,
            media,
            store,
        })
    }
}
