//! SQLite persistence for articles and the keyword category ledger.
//!
//! Two durable tables back the whole application:
//!
//! - `articles`: one row per ingested article, keyed by URL. Inserts are
//!   ignore-on-duplicate, so re-crawling a page never overwrites it.
//! - `keyword_metadata`: the write-once keyword → category ledger. A keyword
//!   is classified at most once and reused by every later report.
//!
//! Everything else (frequency tables, grouped reports) is derived per run.
//!
//! # Submodules
//!
//! - [`articles`]: article ingest, search, export and deletion
//! - [`ledger`]: the keyword category ledger

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

pub mod articles;
pub mod ledger;

/// Handle to the application database.
///
/// Wraps a small connection pool; every operation checks a connection out
/// and returns it when the query completes, on success or error.
#[derive(Clone, Debug)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (creating if needed) the database file at `path` and ensure the
    /// schema exists.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn open(path: &Path) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        info!("Database pool created");

        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    /// A private in-memory database. The pool is pinned to one connection
    /// that never expires, since each SQLite memory connection is its own
    /// database.
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        use std::str::FromStr;

        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    async fn init_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                url TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                published_date TEXT NOT NULL,
                crawled_at TEXT NOT NULL,
                summary TEXT,
                content TEXT,
                tech_level INTEGER,
                keyword_counts TEXT,
                impact_scope TEXT,
                ai_full_json TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS keyword_metadata (
                keyword TEXT PRIMARY KEY,
                category TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Tables ensured to exist");
        Ok(())
    }

    /// Close every pooled connection. Later operations fail with
    /// `sqlx::Error::PoolClosed`.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub(crate) fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}
