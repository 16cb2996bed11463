//! Process configuration, read from the environment at startup.

use std::net::SocketAddr;

use anyhow::{Context, Result, bail};
use syncgate_auth::AuthConfig;
use syncgate_db::DbConfig;

/// Everything the server needs to start.
#[derive(Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Base64-encoded private JWK. Decoded by `SigningKey::load`.
    pub signing_key: String,
    pub auth: AuthConfig,
    pub db: DbConfig,
    /// Apply pending schema migrations before serving.
    pub run_migrations: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &str| var(name).with_context(|| format!("{name} is not set"));

        let bind_addr = var("SYNCGATE_BIND")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse()
            .with_context(|| "parse SYNCGATE_BIND")?;

        let auth = AuthConfig {
            powersync_url: required("POWERSYNC_URL")?,
            powersync_data_free_url: var("POWERSYNC_DATA_FREE_URL"),
            issuer_url: required("SUPABASE_URL")?,
        };

        let defaults = DbConfig::default();
        let db = DbConfig {
            url: var("SYNCGATE_DB_URL").unwrap_or(defaults.url),
            namespace: var("SYNCGATE_DB_NAMESPACE").unwrap_or(defaults.namespace),
            database: var("SYNCGATE_DB_DATABASE").unwrap_or(defaults.database),
            username: var("SYNCGATE_DB_USER").unwrap_or(defaults.username),
            password: var("SYNCGATE_DB_PASSWORD").unwrap_or(defaults.password),
            pool_size: match var("SYNCGATE_DB_POOL_SIZE") {
                Some(v) => v.parse().with_context(|| "parse SYNCGATE_DB_POOL_SIZE")?,
                None => defaults.pool_size,
            },
            acquire_timeout_ms: match var("SYNCGATE_DB_ACQUIRE_TIMEOUT_MS") {
                Some(v) => v
                    .parse()
                    .with_context(|| "parse SYNCGATE_DB_ACQUIRE_TIMEOUT_MS")?,
                None => defaults.acquire_timeout_ms,
            },
        };

        let run_migrations = match var("SYNCGATE_RUN_MIGRATIONS") {
            Some(v) => parse_bool(&v).with_context(|| "parse SYNCGATE_RUN_MIGRATIONS")?,
            None => true,
        };

        Ok(Self {
            bind_addr,
            signing_key: required("POWERSYNC_PRIVATE_KEY")?,
            auth,
            db,
            run_migrations,
        })
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got {other:?}"),
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("signing_key", &"[REDACTED]")
            .field("auth", &self.auth)
            .field("db", &self.db)
            .field("run_migrations", &self.run_migrations)
            .finish()
    }
}
