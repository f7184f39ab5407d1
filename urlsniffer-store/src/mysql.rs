//! MySQL repository, compatible with the honeypot's `output_mysql` database

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::MySqlPool;
use std::collections::HashSet;
use tracing::debug;

use urlsniffer_core::UrlRecord;

use crate::{MySqlSettings, StoreError, StoreResult, UrlRepository};

/// `urls` table in a MySQL database.
///
/// The table carries no unique index on `url` (TEXT columns cannot be fully
/// indexed); uniqueness comes from [`crate::UrlStore`]'s known-URL cache.
pub struct MySqlRepository {
    pool: MySqlPool,
}

impl MySqlRepository {
    pub async fn connect(settings: &MySqlSettings) -> StoreResult<Self> {
        let opts = MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.username)
            .password(&settings.password)
            .database(&settings.database);

        debug!(
            "Connecting to MySQL {}@{}:{}/{}",
            settings.username, settings.host, settings.port, settings.database
        );

        let pool = MySqlPoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await
            .map_err(|e| StoreError::Connect(e.to_string()))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl UrlRepository for MySqlRepository {
    fn name(&self) -> &str {
        "mysql"
    }

    async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS urls (
                id INT AUTO_INCREMENT PRIMARY KEY,
                url TEXT NOT NULL,
                first_view DATETIME(6) NULL,
                last_view DATETIME(6) NULL
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
        sqlx::query("INSERT INTO urls (url, first_view, last_view) VALUES (?, ?, ?)")
            .bind(url)
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn touch(&self, url: &str, now: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query(
            "UPDATE urls SET last_view = ? WHERE url = ? AND (last_view IS NULL OR last_view < ?)",
        )
        .bind(now)
        .bind(url)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch(&self, url: &str) -> StoreResult<Option<UrlRecord>> {
        let row: Option<(String, Option<NaiveDateTime>, Option<NaiveDateTime>)> =
            sqlx::query_as("SELECT url, first_view, last_view FROM urls WHERE url = ? LIMIT 1")
                .bind(url)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(url, first_view, last_view)| UrlRecord {
            url,
            first_view: first_view.map(|ts| ts.and_utc()),
            last_view: last_view.map(|ts| ts.and_utc()),
        }))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
