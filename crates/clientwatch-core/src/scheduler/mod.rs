//! Fixed-interval scheduler
//!
//! The Poller is the host-facing lifecycle around a [`TransitionEngine`]:
//!
//! - **start**: [`Poller::start()`] seeds baselines; failure is fatal
//! - **tick**: [`Poller::on_tick()`] runs one cycle; failures are logged and ridden out
//! - **stop**: resolve the shutdown future passed to [`Poller::run_until()`]
//!
//! ## Timing
//!
//! ```text
//! seed ──interval──▶ cycle ──interval──▶ cycle ──interval──▶ ...
//! ```
//!
//! The first cycle waits a full interval after seeding so the controller
//! has refreshed its uptime counters. Ticks run inline on the polling task,
//! so a cycle never starts while the previous one is still running; a tick
//! that comes due during a slow cycle is delayed, not bursted.

use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::engine::{CycleSummary, TransitionEngine};
use crate::error::{Error, Result};

/// Drives a [`TransitionEngine`] at a fixed interval
pub struct Poller {
    engine: TransitionEngine,
    interval: Duration,
    first_tick: Instant,
}

impl Poller {
    /// Seed the engine and prepare to poll
    ///
    /// # Returns
    ///
    /// - `Ok(Poller)`: Baselines established
    /// - `Err(Error::Config)`: Zero interval
    /// - `Err(Error::SourceUnavailable)`: Seeding poll failed (no baseline possible)
    pub async fn start(engine: TransitionEngine, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(Error::config("Poll interval must be > 0"));
        }

        let seeded = engine.seed().await.inspect_err(|e| {
            error!("Initial poll failed, cannot establish baselines: {}", e);
        })?;

        info!(
            "Poller started: {} client(s) baselined, first cycle in {:?}",
            seeded, interval
        );

        Ok(Self {
            engine,
            interval,
            first_tick: Instant::now() + interval,
        })
    }

    pub fn engine(&self) -> &TransitionEngine {
        &self.engine
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one cycle, absorbing failures
    ///
    /// Returns `None` when the cycle failed; memory is untouched in that
    /// case and the next tick tries again.
    pub async fn on_tick(&self) -> Option<CycleSummary> {
        match self.engine.run_cycle().await {
            Ok(summary) => {
                if summary.transitions > 0 {
                    info!(
                        "Cycle dispatched {} transition(s) ({} failed)",
                        summary.transitions, summary.dispatch_failures
                    );
                }
                Some(summary)
            }
            Err(e) if e.is_transient() => {
                warn!("Poll cycle failed, retrying next tick: {}", e);
                None
            }
            Err(e) => {
                error!("Poll cycle failed unexpectedly, retrying next tick: {}", e);
                None
            }
        }
    }

    /// Poll until the oneshot fires or its sender is dropped
    pub async fn run_with_shutdown(&self, shutdown_rx: oneshot::Receiver<()>) -> Result<()> {
        self.run_until(async {
            let _ = shutdown_rx.await;
        })
        .await
    }

    /// Poll until `shutdown` resolves
    ///
    /// Shutdown is only checked between cycles; a cycle already running
    /// completes before this returns.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval_at(self.first_tick, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }

                _ = ticker.tick() => {}
            }

            self.on_tick().await;
        }

        info!("Poller stopped");
        Ok(())
    }
}
