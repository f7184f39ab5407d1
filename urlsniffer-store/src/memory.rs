//! Process-local repository (no durability beyond the process)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashSet;

use urlsniffer_core::UrlRecord;

use crate::{StoreResult, UrlRepository};

/// In-memory `urls` table
#[derive(Debug, Default)]
pub struct MemoryRepository {
    records: DashMap<String, UrlRecord>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl UrlRepository for MemoryRepository {
    fn name(&self) -> &str {
        "memory"
    }

    async fn ensure_schema(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn load_all_urls(&self) -> StoreResult<HashSet<String>> {
        Ok(self.records.iter().map(|entry| entry.key().clone()).collect())
    }

    async fn insert(&self, url: &str, now: DateTime<Utc>) -> StoreResult<()> {
        self.records
            .entry(url.to_string())
            .and_modify(|record| {
                record.touch(now);
            })
            .or_insert_with(|| UrlRecord::new(url, now));
        Ok(())
    }

    async fn touch(&self, url: &str, now: DateTime<Utc>) -> StoreResult<()> {
        if let Some(mut record) = self.records.get_mut(url) {
            record.touch(now);
        }
        Ok(())
    }

    async fn fetch(&self, url: &str) -> StoreResult<Option<UrlRecord>> {
        Ok(self.records.get(url).map(|record| record.clone()))
    }

    async fn close(&self) {}
}
