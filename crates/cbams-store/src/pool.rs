//! Database pool with split reader/writer connections in WAL mode.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::error::StoreResult;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://cbams.db";

/// Split read/write pool for SQLite.
///
/// - `reader`: up to 8 read-only connections for concurrent SELECTs.
/// - `writer`: a single connection, so writes are serialized.
#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Connect and apply migrations on the writer before opening readers.
    pub async fn new(database_url: &str) -> StoreResult<Self> {
        let base_opts = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        let read_opts = base_opts.clone().read_only(true);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(base_opts)
            .await?;

        sqlx::migrate!().run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(read_opts)
            .await?;

        info!("Database ready at {}", database_url);

        Ok(Self { reader, writer })
    }

    /// Connect using `DATABASE_URL`.
    pub async fn from_env() -> StoreResult<Self> {
        Self::new(&default_database_url()).await
    }

    /// Cheap round trip for readiness checks.
    pub async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.reader).await?;
        Ok(())
    }
}

/// `DATABASE_URL`, falling back to `sqlite://cbams.db`.
pub fn default_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}
