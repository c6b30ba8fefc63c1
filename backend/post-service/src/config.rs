/// Configuration management for post-service
///
/// Everything is read from environment variables; `main` loads `.env`
/// through dotenvy before calling [`Config::from_env`].
use s3_utils::S3Config;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("failed to read {var} from {path}: {source}")]
    ReadFile {
        var: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub store: StoreBackend,
    pub jwt: JwtConfig,
    pub media: MediaConfig,
    pub cors: CorsConfig,
    pub reactions: ReactionConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

#[derive(Clone)]
pub struct DatabaseConfig {
    /// Empty when the in-memory store is selected
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("expected 'postgres' or 'memory', got '{other}'")),
        }
    }
}

#[derive(Clone)]
pub struct JwtConfig {
    pub private_key_pem: String,
    pub public_key_pem: String,
    pub access_token_ttl_secs: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("private_key_pem", &"<redacted>")
            .field("public_key_pem", &"<redacted>")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaBackend {
    S3,
    Memory,
}

impl FromStr for MediaBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s3" => Ok(MediaBackend::S3),
            "memory" => Ok(MediaBackend::Memory),
            other => Err(format!("expected 's3' or 'memory', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub backend: MediaBackend,
    pub s3: S3Config,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

impl CorsConfig {
    pub fn origins(&self) -> impl Iterator<Item = &str> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
    }

    pub fn allows_any(&self) -> bool {
        self.allowed_origins.trim() == "*"
    }
}

#[derive(Debug, Clone)]
pub struct ReactionConfig {
    /// Attempts at a version-checked save before answering 409
    pub max_attempts: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let app = AppConfig {
            env: env_or("APP_ENV", "development"),
            host: env_or("APP_HOST", "0.0.0.0"),
            port: parse_env_or_default("PORT", 3000)?,
        };

        let store: StoreBackend = parse_env_or_default("STORE_BACKEND", StoreBackend::Postgres)?;

        let database = DatabaseConfig {
            url: match (std::env::var("DATABASE_URL"), store) {
                (Ok(url), _) if !url.trim().is_empty() => url,
                (_, StoreBackend::Memory) => String::new(),
                (_, StoreBackend::Postgres) => return Err(ConfigError::Missing("DATABASE_URL")),
            },
            max_connections: parse_env_or_default("DB_MAX_CONNECTIONS", 10)?,
            min_connections: parse_env_or_default("DB_MIN_CONNECTIONS", 1)?,
        };
        if database.min_connections > database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS",
                reason: "must not exceed DB_MAX_CONNECTIONS".to_string(),
            });
        }

        let jwt = JwtConfig {
            private_key_pem: pem_from_env("JWT_PRIVATE_KEY_PEM", "JWT_PRIVATE_KEY_FILE")?,
            public_key_pem: pem_from_env("JWT_PUBLIC_KEY_PEM", "JWT_PUBLIC_KEY_FILE")?,
            access_token_ttl_secs: parse_env_or_default("JWT_ACCESS_TOKEN_TTL_SECS", 3600)?,
        };
        if jwt.access_token_ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                var: "JWT_ACCESS_TOKEN_TTL_SECS",
                reason: "must be positive".to_string(),
            });
        }

        let media = MediaConfig {
            backend: parse_env_or_default("MEDIA_BACKEND", MediaBackend::S3)?,
            s3: S3Config::from_env().map_err(|e| ConfigError::Invalid {
                var: "S3_*",
                reason: e.to_string(),
            })?,
            max_upload_bytes: parse_env_or_default("MEDIA_MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
        };
        if media.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid {
                var: "MEDIA_MAX_UPLOAD_BYTES",
                reason: "must be positive".to_string(),
            });
        }

        let cors = CorsConfig {
            allowed_origins: match std::env::var("CORS_ALLOWED_ORIGINS") {
                Ok(value) => value,
                Err(_) if app.is_production() => return Err(ConfigError::Missing("CORS_ALLOWED_ORIGINS")),
                Err(_) => "http://localhost:3000".to_string(),
            },
        };
        if app.is_production() && cors.allows_any() {
            return Err(ConfigError::Invalid {
                var: "CORS_ALLOWED_ORIGINS",
                reason: "cannot be '*' in production".to_string(),
            });
        }

        let reactions = ReactionConfig {
            max_attempts: parse_env_or_default("REACTION_MAX_ATTEMPTS", 5)?,
        };
        if reactions.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                var: "REACTION_MAX_ATTEMPTS",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Config {
            app,
            database,
            store,
            jwt,
            media,
            cors,
            reactions,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env_or_default<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: key,
            reason: format!("'{val}': {e}"),
        }),
        Err(_) => Ok(default),
    }
}

/// Inline PEM from `pem_var`, or the contents of the file named by `file_var`
fn pem_from_env(pem_var: &'static str, file_var: &'static str) -> Result<String, ConfigError> {
    if let Ok(pem) = std::env::var(pem_var) {
        if !pem.trim().is_empty() {
            // Single-line env values carry escaped newlines
            return Ok(pem.replace("\\n", "\n"));
        }
    }

    match std::env::var(file_var) {
        Ok(path) => std::fs::read_to_string(&path).map_err(|source| ConfigError::ReadFile {
            var: file_var,
            path,
            source,
        }),
        Err(_) => Err(ConfigError::Missing(pem_var)),
    }
}
