//! TCP reachability probes
//!
//! A URL counts as live when a TCP connection to its host and port can be
//! opened within the timeout. Nothing is sent; the socket is dropped at once.

use async_trait::async_trait;
use regex::Regex;
use std::future::Future;
use std::io;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use urlsniffer_core::DEFAULT_PROBE_TIMEOUT_SECS;

static TARGET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(https?)://((?:\d{1,3}\.){3}\d{1,3}|(?:[a-zA-Z0-9-]+\.)+[a-zA-Z]{2,})(?::(\d+))?",
    )
    .unwrap()
});

/// Probe configuration
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Connect timeout in seconds (covers name resolution too)
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
        }
    }
}

/// Errors from a single probe
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("No probeable host in URL: {0}")]
    Unparsable(String),

    #[error("Invalid port: {0}")]
    InvalidPort(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Connection failed: {0}")]
    Connect(#[from] io::Error),
}

/// Host and port a URL points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub host: String,
    pub port: u16,
}

impl ProbeTarget {
    /// Resolve the probe target for `url`.
    ///
    /// The host must be a dotted-quad IPv4 literal or a hostname ending in an
    /// alphabetic label of two or more letters. Without an explicit port,
    /// `https` maps to 443 and `http` to 80.
    pub fn parse(url: &str) -> Result<Self, ProbeError> {
        let caps = TARGET_REGEX
            .captures(url)
            .ok_or_else(|| ProbeError::Unparsable(url.to_string()))?;

        let host = caps[2].to_string();
        let port = match caps.get(3) {
            Some(port) => port
                .as_str()
                .parse::<u16>()
                .map_err(|_| ProbeError::InvalidPort(port.as_str().to_string()))?,
            None if &caps[1] == "https" => 443,
            None => 80,
        };

        Ok(Self { host, port })
    }
}

/// Anything that can tell whether a URL is live
#[async_trait]
pub trait Reachability: Send + Sync {
    /// Never fails; unparsable URLs and network errors are simply not live.
    async fn is_reachable(&self, url: &str) -> bool;
}

/// Plain TCP connect probe
#[derive(Debug, Clone, Default)]
pub struct TcpProbe {
    config: ProbeConfig,
}

impl TcpProbe {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    /// Attempt one connection to the URL's target, reporting why it failed.
    pub async fn connect(&self, url: &str) -> Result<ProbeTarget, ProbeError> {
        let target = ProbeTarget::parse(url)?;

        let stream = within(
            self.config.timeout_secs,
            TcpStream::connect((target.host.as_str(), target.port)),
        )
        .await?;
        drop(stream);

        Ok(target)
    }
}

/// Run a connect attempt under a budget of `timeout_secs`
async fn within<T>(
    timeout_secs: u64,
    attempt: impl Future<Output = io::Result<T>>,
) -> Result<T, ProbeError> {
    let budget = Duration::from_secs(timeout_secs);
    Ok(timeout(budget, attempt)
        .await
        .map_err(|_| ProbeError::Timeout(timeout_secs))??)
}

#[async_trait]
impl Reachability for TcpProbe {
    async fn is_reachable(&self, url: &str) -> bool {
        match self.connect(url).await {
            Ok(target) => {
                debug!("{} is live ({}:{})", url, target.host, target.port);
                true
            }
            Err(e) => {
                debug!("{} is not live: {}", url, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn test_default_config() {
        assert_eq!(ProbeConfig::default().timeout_secs, 5);
    }

    #[test]
    fn test_parse_default_ports() {
        let target = ProbeTarget::parse("http://web.evil.com/x.sh").unwrap();
        assert_eq!(target, ProbeTarget { host: "web.evil.com".to_string(), port: 80 });

        let target = ProbeTarget::parse("https://web.evil.com").unwrap();
        assert_eq!(target.port, 443);
    }

    #[test]
    fn test_parse_ip_and_explicit_port() {
        let target = ProbeTarget::parse("https://10.0.0.1:8443/a").unwrap();
        assert_eq!(target.host, "10.0.0.1");
        assert_eq!(target.port, 8443);
    }

    #[test]
    fn test_parse_rejects() {
        assert!(matches!(ProbeTarget::parse(""), Err(ProbeError::Unparsable(_))));
        assert!(matches!(ProbeTarget::parse("www.bad.org/p"), Err(ProbeError::Unparsable(_))));
        assert!(matches!(ProbeTarget::parse("http://localhost/"), Err(ProbeError::Unparsable(_))));
        assert!(matches!(ProbeTarget::parse("http://a.com:99999/"), Err(ProbeError::InvalidPort(_))));
    }

    // A real connect that hangs depends on the host's network (backlog limits,
    // firewalls), so the budget is checked against an attempt that never finishes.
    #[tokio::test]
    async fn test_stalled_connect_times_out() {
        let stalled = std::future::pending::<io::Result<()>>();
        assert!(matches!(within(1, stalled).await, Err(ProbeError::Timeout(1))));
    }

    #[tokio::test]
    async fn test_failed_connect_is_reported() {
        let refused = async { Err::<(), _>(io::Error::from(io::ErrorKind::ConnectionRefused)) };
        assert!(matches!(within(1, refused).await, Err(ProbeError::Connect(_))));
    }

    #[tokio::test]
    async fn test_unparsable_is_not_reachable() {
        let probe = TcpProbe::default();
        assert!(!probe.is_reachable("").await);
        assert!(!probe.is_reachable("not a url").await);
    }

    #[tokio::test]
    async fn test_live_listener_is_reachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let probe = TcpProbe::default();
        assert!(probe.is_reachable(&format!("http://127.0.0.1:{}/payload", port)).await);
    }

    #[tokio::test]
    async fn test_closed_port_is_not_reachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let probe = TcpProbe::new(ProbeConfig { timeout_secs: 1 });
        assert!(!probe.is_reachable(&format!("http://127.0.0.1:{}/", port)).await);
    }
}
