//! SQLite repository

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use urlsniffer_core::UrlRecord;

use crate::{StoreError, StoreResult, UrlRepository};

/// Fixed-width so that text comparison in SQL orders chronologically
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// `urls` table in a SQLite database
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Open (creating if missing) a database file
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Connect(format!("{}: {}", parent.display(), e)))?;
        }

        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        debug!("Opening SQLite store at {}", path.display());
        Self::with_options(opts).await
    }

    /// Private database living as long as the repository
    pub async fn in_memory() -> StoreResult<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StoreError::Connect(e.to_string()))?;
        Self::with_options(opts).await
    }

    async fn with_options(opts: SqliteConnectOptions) -> StoreResult<Self> {
        // One connection: writes are serialized and `:memory:` stays a single database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await
            .map_err(|e| StoreError::Connect(e.to_string()))?;

        Ok(Self { pool })
    }
}

fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn decode_timestamp(raw: Option<String>) -> StoreResult<Option<DateTime<Utc>>> {
    raw.map(|s| {
        NaiveDateTime::parse_from_str(&s, TIMESTAMP_PARSE_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(|_| StoreError::Timestamp(s))
    })
    .transpose()
}

#[async_trait]
impl UrlRepository for SqliteRepository {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS urls (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL UNIQUE,
                first_view DATETIME NULL,
                last_view DATETIME NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_all_urls(&self) -> StoreResult<HashSet<String>> {
        let urls: Vec<String> = sqlx::query_scalar("SELECT url FROM urls")
            .fetch_all(&self.pool)
            .await?;
        Ok(urls.into_iter().collect())
    }

    async fn insert(&self, url: &str, now: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO urls (url, first_view, last_view) VALUES (?1, ?2, ?2)
            ON CONFLICT(url) DO UPDATE SET last_view = excluded.last_view
            WHERE urls.last_view IS NULL OR urls.last_view < excluded.last_view
            ",
        )
        .bind(url)
        .bind(encode_timestamp(now))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn touch(&self, url: &str, now: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query(
            "UPDATE urls SET last_view = ?1 WHERE url = ?2 AND (last_view IS NULL OR last_view < ?1)",
        )
        .bind(encode_timestamp(now))
        .bind(url)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch(&self, url: &str) -> StoreResult<Option<UrlRecord>> {
        let row: Option<(String, Option<String>, Option<String>)> =
            sqlx::query_as("SELECT url, first_view, last_view FROM urls WHERE url = ?1")
                .bind(url)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(url, first_view, last_view)| {
            Ok(UrlRecord {
                url,
                first_view: decode_timestamp(first_view)?,
                last_view: decode_timestamp(last_view)?,
            })
        })
        .transpose()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
