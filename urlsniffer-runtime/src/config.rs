//! Sniffer configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use urlsniffer_core::{DEFAULT_PROBE_TIMEOUT_SECS, DEFAULT_SWEEP_CONCURRENCY, DEFAULT_VERIFY_INTERVAL_SECS};
use urlsniffer_net::ProbeConfig;
use urlsniffer_store::StoreConfig;

/// Sniffer configuration, loadable from TOML
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SnifferConfig {
    /// Seconds between re-verification sweeps
    pub verify_interval: u64,
    /// TCP connect timeout in seconds
    pub probe_timeout: u64,
    /// Maximum probes in flight during a sweep
    pub sweep_concurrency: usize,
    /// Backend holding the `urls` table
    pub store: StoreConfig,
}

impl Default for SnifferConfig {
    fn default() -> Self {
        Self {
            verify_interval: DEFAULT_VERIFY_INTERVAL_SECS,
            probe_timeout: DEFAULT_PROBE_TIMEOUT_SECS,
            sweep_concurrency: DEFAULT_SWEEP_CONCURRENCY,
            store: StoreConfig::default(),
        }
    }
}

impl SnifferConfig {
    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn verify_period(&self) -> Duration {
        Duration::from_secs(self.verify_interval.max(1))
    }

    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            timeout_secs: self.probe_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SnifferConfig::default();
        assert_eq!(config.verify_interval, 300);
        assert_eq!(config.probe_timeout, 5);
        assert!(matches!(config.store, StoreConfig::Memory));
    }

    #[test]
    fn test_from_toml() {
        let config = SnifferConfig::from_toml(
            r#"
            verify_interval = 60

            [store]
            driver = "mysql"
            host = "db.internal"
            database = "cowrie"
            username = "cowrie"
            password = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.verify_interval, 60);
        assert_eq!(config.sweep_concurrency, 16);
        match config.store {
            StoreConfig::Mysql(settings) => {
                assert_eq!(settings.host, "db.internal");
                assert_eq!(settings.port, 3306);
            }
            other => panic!("unexpected store: {:?}", other),
        }
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = SnifferConfig::from_toml("").unwrap();
        assert_eq!(config.verify_period(), Duration::from_secs(300));
    }

    #[test]
    fn test_unknown_driver_rejected() {
        assert!(SnifferConfig::from_toml("[store]\ndriver = \"redis\"\n").is_err());
    }
}
