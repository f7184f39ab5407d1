//! Periodic Verifier
//!
//! Re-probes every known URL on a fixed interval and touches the live ones,
//! so `last_view` tracks infrastructure that is still up.
//! - One sweep at a time; an overlapping tick is skipped
//! - Probes within a sweep run concurrently, bounded by `max_concurrent`
//! - Shutdown abandons an in-flight sweep

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use urlsniffer_net::Reachability;
use urlsniffer_store::{StoreError, UrlStore};

/// Shortest accepted interval between sweeps
pub const MIN_SWEEP_PERIOD: Duration = Duration::from_millis(10);

/// Errors from a sweep
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("A sweep is already running")]
    Busy,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Summary of one sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// URLs probed
    pub checked: usize,
    /// URLs that answered
    pub live: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Clears the running flag even when the sweep future is dropped mid-way
struct SweepGuard<'a>(&'a AtomicBool);

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Re-verifies known URLs
pub struct PeriodicVerifier {
    store: Arc<UrlStore>,
    probe: Arc<dyn Reachability>,
    max_concurrent: usize,
    running: AtomicBool,
    last_report: Mutex<Option<SweepReport>>,
}

impl PeriodicVerifier {
    pub fn new(store: Arc<UrlStore>, probe: Arc<dyn Reachability>, max_concurrent: usize) -> Self {
        Self {
            store,
            probe,
            max_concurrent: max_concurrent.max(1),
            running: AtomicBool::new(false),
            last_report: Mutex::new(None),
        }
    }

    /// Whether a sweep is in progress
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Report of the last completed sweep
    pub fn last_report(&self) -> Option<SweepReport> {
        self.last_report.lock().clone()
    }

    /// Probe every persisted URL once, touching the live ones
    pub async fn sweep(&self) -> Result<SweepReport, VerifyError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(VerifyError::Busy);
        }
        let _guard = SweepGuard(&self.running);

        let started_at = Utc::now();
        let urls = self.store.load_all_urls().await?;
        let checked = urls.len();

        let live: usize = stream::iter(urls)
            .map(|url| async move {
                if !self.probe.is_reachable(&url).await {
                    return 0;
                }
                match self.store.touch(&url, Utc::now()).await {
                    Ok(()) => 1,
                    Err(e) => {
                        warn!("Failed to mark {} live: {}", url, e);
                        0
                    }
                }
            })
            .buffer_unordered(self.max_concurrent)
            .fold(0, |acc, n| async move { acc + n })
            .await;

        let report = SweepReport {
            checked,
            live,
            started_at,
            finished_at: Utc::now(),
        };
        *self.last_report.lock() = Some(report.clone());
        Ok(report)
    }

    /// Sweep every `period` until `shutdown` flips or its sender is dropped.
    ///
    /// The first sweep happens one full period after the call. Periods below
    /// [`MIN_SWEEP_PERIOD`] are raised to it.
    pub async fn run(self: Arc<Self>, period: Duration, mut shutdown: watch::Receiver<bool>) {
        let period = period.max(MIN_SWEEP_PERIOD);
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Verifier started, sweeping every {:?}", period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }

            tokio::select! {
                result = self.sweep() => match result {
                    Ok(report) => info!(
                        "Sweep done: {}/{} URLs live",
                        report.live, report.checked
                    ),
                    Err(VerifyError::Busy) => warn!("Previous sweep still running, skipping tick"),
                    Err(e) => warn!("Sweep failed: {}", e),
                },
                _ = shutdown.changed() => {
                    warn!("Abandoning sweep on shutdown");
                    break;
                }
            }
        }

        debug!("Verifier stopped");
    }
}
