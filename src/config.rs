use anyhow::bail;
use serde::Deserialize;

/// One year. Keeps `Max-Age` and expiry arithmetic far from overflow.
pub const SESSION_TTL_MAX_MINUTES: i64 = 365 * 24 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub ttl_minutes: i64,
    pub cookie_secure: bool,
    pub purge_interval_secs: u64,
}

impl SessionConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(1..=SESSION_TTL_MAX_MINUTES).contains(&self.ttl_minutes) {
            bail!(
                "SESSION_TTL_MINUTES must be between 1 and {SESSION_TTL_MAX_MINUTES}, got {}",
                self.ttl_minutes
            );
        }
        if self.purge_interval_secs == 0 {
            bail!("SESSION_PURGE_INTERVAL_SECS must be greater than zero");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let session = SessionConfig {
            ttl_minutes: env_or("SESSION_TTL_MINUTES", 120),
            cookie_secure: std::env::var("SESSION_COOKIE_SECURE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            purge_interval_secs: env_or("SESSION_PURGE_INTERVAL_SECS", 600),
        };
        session.validate()?;
        Ok(Self {
            database_url,
            max_connections: env_or("DB_MAX_CONNECTIONS", 10),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("APP_PORT", 8080),
            session,
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
