//! Observation Handler
//!
//! Turns one honeypot event into URL records.
//! - File downloads: the structured `url` field, taken verbatim
//! - Command input: URLs extracted from the deobfuscated command text
//! - Every candidate is upserted, then probed; live ones are touched again

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use urlsniffer_core::{extract_urls, Event, EventKind};
use urlsniffer_net::Reachability;
use urlsniffer_store::{Upsert, UrlStore};

/// Outcome of handling one event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Observation {
    /// URLs found in the event
    pub candidates: usize,
    /// URLs seen for the first time
    pub inserted: usize,
    /// URLs that answered the liveness probe
    pub live: usize,
}

/// Handles events delivered by the honeypot
#[derive(Clone)]
pub struct ObservationHandler {
    store: Arc<UrlStore>,
    probe: Arc<dyn Reachability>,
}

impl ObservationHandler {
    pub fn new(store: Arc<UrlStore>, probe: Arc<dyn Reachability>) -> Self {
        Self { store, probe }
    }

    /// URLs an event refers to; empty for irrelevant or malformed events
    pub fn candidates(event: &Event) -> HashSet<String> {
        match event.kind() {
            EventKind::FileDownload => event
                .url
                .iter()
                .filter(|url| !url.is_empty())
                .cloned()
                .collect(),
            EventKind::CommandInput => event
                .input
                .as_deref()
                .map(extract_urls)
                .unwrap_or_default(),
            EventKind::Other => HashSet::new(),
        }
    }

    /// Record every URL in `event` and probe it.
    ///
    /// Store failures for one URL are logged and do not stop the others.
    pub async fn handle(&self, event: &Event) -> Observation {
        let urls = Self::candidates(event);
        let mut observation = Observation {
            candidates: urls.len(),
            ..Default::default()
        };

        if urls.is_empty() {
            return observation;
        }
        debug!("Event {} carries {} URLs", event.id(), urls.len());

        for url in urls {
            match self.store.upsert(&url, Utc::now()).await {
                Ok(Upsert::Inserted) => observation.inserted += 1,
                Ok(Upsert::Touched) => {}
                Err(e) => {
                    warn!("Failed to record {}: {}", url, e);
                    continue;
                }
            }

            if !self.probe.is_reachable(&url).await {
                continue;
            }
            observation.live += 1;

            if let Err(e) = self.store.touch(&url, Utc::now()).await {
                warn!("Failed to mark {} live: {}", url, e);
            }
        }

        observation
    }
}
