use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for environment variable {key}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub redis_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    /// Unset means nobody can self-register as admin.
    pub admin_secret: Option<String>,
    pub bcrypt_cost: u32,
    pub product_cache_ttl_secs: u64,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    /// Key the rate limiter on `X-Real-IP`/`X-Forwarded-For`. Only safe
    /// behind a proxy that overwrites those headers.
    pub trust_proxy_headers: bool,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let jwt_expiration_secs = match env::var("JWT_EXPIRATION") {
            Ok(raw) => parse_hours(&raw)
                .and_then(hours_to_secs)
                .ok_or(ConfigError::Invalid {
                    key: "JWT_EXPIRATION",
                    value: raw,
                })?,
            Err(_) => 24 * 3600,
        };

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            database_max_connections: optional("DATABASE_MAX_CONNECTIONS", 10)?,
            redis_url: required("REDIS_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiration_secs,
            admin_secret: env::var("ADMIN_SECRET_KEY").ok().filter(|s| !s.is_empty()),
            bcrypt_cost: optional("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            product_cache_ttl_secs: optional("PRODUCT_CACHE_TTL", 60)?,
            rate_limit_window_secs: optional("RATE_LIMIT_WINDOW", 15 * 60)?,
            rate_limit_requests: optional("RATE_LIMIT_REQUESTS", 100)?,
            trust_proxy_headers: optional("TRUST_PROXY_HEADERS", false)?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            server_port: optional("SERVER_PORT", 5000)?,
            api_base_uri: env::var("API_BASE_URI").unwrap_or_else(|_| "/api".into()),
        })
    }

    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn optional<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Accepts `24` as well as `24h`.
fn parse_hours(raw: &str) -> Option<u64> {
    raw.trim().trim_end_matches('h').parse().ok()
}

fn hours_to_secs(hours: u64) -> Option<u64> {
    hours.checked_mul(3600)
}
