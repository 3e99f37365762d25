//! Opens the thermostat state database and brings its schema up to date.

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};

use crate::error::StorageError;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_CONNECTIONS: u32 = 4;

/// Where the state database lives and how connections wait on it.
#[derive(Debug, Clone)]
pub struct Config {
    database_url: String,
    busy_timeout: Duration,
}

impl Config {
    /// `database_url` is a `SQLite` URL such as `sqlite:thermolink.db` or
    /// `sqlite::memory:`. The file is created when missing.
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// How long a write waits on a locked database before failing.
    #[must_use]
    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }

    fn connect_options(&self) -> Result<SqliteConnectOptions, StorageError> {
        let options = SqliteConnectOptions::from_str(&self.database_url)
            .map_err(|source| self.open_error(source))?
            .create_if_missing(true)
            .busy_timeout(self.busy_timeout)
            .synchronous(SqliteSynchronous::Normal);
        if self.is_in_memory() {
            Ok(options)
        } else {
            Ok(options.journal_mode(SqliteJournalMode::Wal))
        }
    }

    fn open_error(&self, source: sqlx::Error) -> StorageError {
        StorageError::Open {
            url: self.database_url.clone(),
            source,
        }
    }

    /// Open the database and run pending migrations.
    ///
    /// An in-memory database lives on a single connection that is never
    /// recycled, so it lasts as long as the pool.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] when the URL is invalid or the file
    /// cannot be opened or created, and [`StorageError::Migration`] when the
    /// schema cannot be brought up to date.
    pub async fn build(self) -> Result<Database, StorageError> {
        let mut pool_options = SqlitePoolOptions::new().max_connections(MAX_CONNECTIONS);
        if self.is_in_memory() {
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = pool_options
            .connect_with(self.connect_options()?)
            .await
            .map_err(|source| self.open_error(source))?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Database { pool })
    }
}

/// Open state database.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
