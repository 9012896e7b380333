use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub session: SessionConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub club: ClubConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackend,

    /// Keep an in-memory copy to serve reads while PostgreSQL is unreachable.
    #[serde(default = "default_fallback_enabled")]
    pub fallback_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Admin login attempts allowed per client IP per minute; 0 disables the limit.
    #[serde(default = "default_login_rate_limit")]
    pub login_rate_limit_per_minute: u32,

    /// Send Strict-Transport-Security. Only behind TLS termination.
    #[serde(default)]
    pub hsts_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// HMAC key for admin session tokens. Never sent to clients.
    #[serde(default)]
    pub signing_secret: String,

    #[serde(default = "default_session_ttl")]
    pub ttl_secs: i64,

    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    #[serde(default = "default_cookie_secure")]
    pub cookie_secure: bool,

    /// `strict`, `lax` or `none`.
    #[serde(default = "default_same_site")]
    pub same_site: String,

    /// Cookie set by older clients; always cleared, never trusted.
    #[serde(default = "default_legacy_cookie_name")]
    pub legacy_cookie_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfig {
    /// Bootstrap passcode used until one is stored.
    #[serde(default)]
    pub passcode: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClubConfig {
    /// Offset of the club's local time from UTC; week boundaries use it.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl ClubConfig {
    pub fn offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes.checked_mul(60)?)
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_storage_backend() -> StorageBackend {
    StorageBackend::Postgres
}
fn default_fallback_enabled() -> bool {
    true
}
fn default_max_connections() -> u32 {
    10
}
fn default_min_connections() -> u32 {
    1
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_login_rate_limit() -> u32 {
    10
}
fn default_session_ttl() -> i64 {
    86_400 // 24 hours
}
fn default_cookie_name() -> String {
    "admin_session".to_string()
}
fn default_cookie_secure() -> bool {
    true
}
fn default_same_site() -> String {
    "strict".to_string()
}
fn default_legacy_cookie_name() -> String {
    "isAdmin".to_string()
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

const MIN_SIGNING_SECRET_LENGTH: usize = 32;

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with CLUB__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("CLUB").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Configuration built from embedded defaults plus overrides, without
    /// touching the file system. Validation is skipped so tests can build
    /// partial configs.
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "127.0.0.1"
            port = 8080
            request_timeout_secs = 30

            [storage]
            backend = "memory"
            fallback_enabled = false

            [database]
            url = ""

            [logging]
            level = "info"
            format = "pretty"

            [security]
            cors_origins = []
            login_rate_limit_per_minute = 0

            [session]
            signing_secret = "test-signing-secret-test-signing-secret"
            ttl_secs = 86400
            cookie_name = "admin_session"
            cookie_secure = false
            same_site = "strict"
            legacy_cookie_name = "isAdmin"

            [admin]
            passcode = "246810"

            [club]
            utc_offset_minutes = 420
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.storage.backend == StorageBackend::Postgres && self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "CLUB__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.session.signing_secret.len() < MIN_SIGNING_SECRET_LENGTH {
            return Err(ConfigValidationError::MissingRequired(format!(
                "CLUB__SESSION__SIGNING_SECRET must be at least {} characters",
                MIN_SIGNING_SECRET_LENGTH
            )));
        }

        if self.session.ttl_secs <= 0 {
            return Err(ConfigValidationError::InvalidValue(
                "session.ttl_secs must be positive".to_string(),
            ));
        }

        if !matches!(self.session.same_site.as_str(), "strict" | "lax" | "none") {
            return Err(ConfigValidationError::InvalidValue(format!(
                "session.same_site must be strict, lax or none, got '{}'",
                self.session.same_site
            )));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.club.utc_offset_minutes.abs() > 14 * 60 || self.club.offset().is_none() {
            return Err(ConfigValidationError::InvalidValue(
                "club.utc_offset_minutes must be within +/-14 hours".to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }

    pub fn club_offset(&self) -> FixedOffset {
        self.club.offset().unwrap_or_else(|| Utc.fix())
    }
}
