//! Persisted URL observations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the URL table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    /// The URL exactly as extracted (unique key)
    pub url: String,
    /// When the URL was first observed
    pub first_view: Option<DateTime<Utc>>,
    /// When the URL was last observed or last found live
    pub last_view: Option<DateTime<Utc>>,
}

impl UrlRecord {
    /// A freshly observed URL: both timestamps equal `now`
    pub fn new(url: &str, now: DateTime<Utc>) -> Self {
        Self {
            url: url.to_string(),
            first_view: Some(now),
            last_view: Some(now),
        }
    }

    /// Move `last_view` forward to `now`; earlier timestamps are ignored.
    ///
    /// Returns whether the record changed.
    pub fn touch(&mut self, now: DateTime<Utc>) -> bool {
        match self.last_view {
            Some(last) if last >= now => false,
            _ => {
                self.last_view = Some(now);
                true
            }
        }
    }
}
