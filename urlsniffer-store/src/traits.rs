//! Persistence contract for URL records

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use thiserror::Error;

use urlsniffer_core::UrlRecord;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to connect to store: {0}")]
    Connect(String),

    #[error("Query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("Unreadable timestamp: {0}")]
    Timestamp(String),

    #[error("Invalid store configuration: {0}")]
    Config(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Backend holding the `urls` table.
///
/// Every write is durable when the call returns. Timestamps only ever move
/// `last_view` forward: a touch older than the stored value is a no-op.
#[async_trait]
pub trait UrlRepository: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Create the table if it does not exist
    async fn ensure_schema(&self) -> StoreResult<()>;

    /// Every persisted URL
    async fn load_all_urls(&self) -> StoreResult<HashSet<String>>;

    /// Insert a new record with `first_view = last_view = now`
    async fn insert(&self, url: &str, now: DateTime<Utc>) -> StoreResult<()>;

    /// Set `last_view = now` for an existing record
    async fn touch(&self, url: &str, now: DateTime<Utc>) -> StoreResult<()>;

    /// Fetch a single record
    async fn fetch(&self, url: &str) -> StoreResult<Option<UrlRecord>>;

    /// Release connections
    async fn close(&self);
}
