//! SurrealDB connection management.

use std::time::Duration;

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::pool::{DbPool, PoolOptions};

/// Where the organisation store lives and how hard it may be used.
#[derive(Clone)]
pub struct DbConfig {
    /// Host and port of the SurrealDB WebSocket endpoint.
    pub url: String,
    pub namespace: String,
    pub database: String,
    /// Root credentials.
    pub username: String,
    pub password: String,
    /// Upper bound on lookups in flight at once.
    pub pool_size: usize,
    /// Wait limit for a free lookup slot.
    pub acquire_timeout_ms: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "syncgate".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
            pool_size: 3,
            acquire_timeout_ms: 5_000,
        }
    }
}

impl DbConfig {
    pub fn pool_options(&self) -> PoolOptions {
        PoolOptions {
            max_connections: self.pool_size,
            acquire_timeout: Duration::from_millis(self.acquire_timeout_ms),
        }
    }
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("url", &self.url)
            .field("namespace", &self.namespace)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("pool_size", &self.pool_size)
            .field("acquire_timeout_ms", &self.acquire_timeout_ms)
            .finish()
    }
}

/// A signed-in SurrealDB client plus the pool limits to apply to it.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
    pool_options: PoolOptions,
}

impl DbManager {
    /// Open the WebSocket connection, sign in as root and select the
    /// configured namespace and database.
    pub async fn connect(config: &DbConfig) -> Result<Self, surrealdb::Error> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            pool_size = config.pool_size,
            "Connecting to organisation store"
        );

        let db = Surreal::new::<Ws>(&config.url).await?;
        let credentials = Root {
            username: config.username.clone(),
            password: config.password.clone(),
        };
        db.signin(credentials).await?;
        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        info!("Organisation store connected");
        Ok(Self {
            db,
            pool_options: config.pool_options(),
        })
    }

    /// Raw client, for migrations. Lookups go through [`Self::pool`].
    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }

    /// Build a slot-limited pool over this connection.
    pub fn pool(&self) -> DbPool<Client> {
        DbPool::new(self.db.clone(), self.pool_options.clone())
    }
}
