//! Upsert/touch semantics over a repository
//!
//! The known-URL cache mirrors the persisted keys. It is seeded once when the
//! store opens and updated on every insert, so each URL is inserted at most
//! once no matter how often it is observed.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use urlsniffer_core::UrlRecord;

use crate::{StoreResult, UrlRepository};

/// What an upsert did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// First sighting, new record written
    Inserted,
    /// Already known, `last_view` updated
    Touched,
}

/// URL store with an in-process membership cache
pub struct UrlStore {
    repo: Arc<dyn UrlRepository>,
    // Held across the insert so two concurrent first sightings cannot both insert
    known: Mutex<HashSet<String>>,
}

impl UrlStore {
    /// Ensure the schema exists and seed the known-URL cache
    pub async fn open(repo: Arc<dyn UrlRepository>) -> StoreResult<Self> {
        repo.ensure_schema().await?;
        let known = repo.load_all_urls().await?;
        info!("Loaded {} known URLs from {} store", known.len(), repo.name());

        Ok(Self {
            repo,
            known: Mutex::new(known),
        })
    }

    /// Every persisted URL, read from the backend rather than the cache
    pub async fn load_all_urls(&self) -> StoreResult<HashSet<String>> {
        self.repo.load_all_urls().await
    }

    /// Insert `url` if unseen, otherwise move its `last_view` to `now`
    pub async fn upsert(&self, url: &str, now: DateTime<Utc>) -> StoreResult<Upsert> {
        let mut known = self.known.lock().await;

        if known.contains(url) {
            drop(known);
            self.repo.touch(url, now).await?;
            debug!("Touched known URL {}", url);
            return Ok(Upsert::Touched);
        }

        self.repo.insert(url, now).await?;
        known.insert(url.to_string());
        info!("New URL {}", url);
        Ok(Upsert::Inserted)
    }

    /// Move `last_view` of a known URL to `now`
    pub async fn touch(&self, url: &str, now: DateTime<Utc>) -> StoreResult<()> {
        self.repo.touch(url, now).await
    }

    /// Look up a single record
    pub async fn record(&self, url: &str) -> StoreResult<Option<UrlRecord>> {
        self.repo.fetch(url).await
    }

    /// Whether `url` is in the known-URL cache
    pub async fn is_known(&self, url: &str) -> bool {
        self.known.lock().await.contains(url)
    }

    /// Size of the known-URL cache
    pub async fn known_count(&self) -> usize {
        self.known.lock().await.len()
    }

    /// Release the backend; the cache is dropped with the store
    pub async fn close(&self) {
        self.repo.close().await;
    }
}
