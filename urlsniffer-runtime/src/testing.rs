//! Scripted collaborators for runtime tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;

use urlsniffer_net::Reachability;

/// Answers from a fixed set of live URLs and records every probe
#[derive(Default)]
pub struct ScriptedProbe {
    live: Mutex<HashSet<String>>,
    probed: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    pub fn with_live(urls: &[&str]) -> Self {
        Self {
            live: Mutex::new(urls.iter().map(|u| u.to_string()).collect()),
            probed: Mutex::new(Vec::new()),
        }
    }

    pub fn set_live(&self, url: &str) {
        self.live.lock().insert(url.to_string());
    }

    pub fn probed(&self) -> Vec<String> {
        self.probed.lock().clone()
    }
}

#[async_trait]
impl Reachability for ScriptedProbe {
    async fn is_reachable(&self, url: &str) -> bool {
        self.probed.lock().push(url.to_string());
        self.live.lock().contains(url)
    }
}
