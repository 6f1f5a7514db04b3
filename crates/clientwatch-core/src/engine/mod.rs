//! Transition engine
//!
//! The TransitionEngine is responsible for:
//! - Pulling a fresh client table from the ClientSource
//! - Filtering it down to the watch-list
//! - Diffing each watched record against ClientMemory
//! - Dispatching an event for every status flip
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐
//! │ ClientSource │─── Vec<ClientSnapshot> ───┐
//! └──────────────┘                           │
//!                                            ▼
//!                                 ┌──────────────────┐
//!                                 │ TransitionEngine │
//!                                 └──────────────────┘
//!                                            │
//!                    ┌───────────────────────┴───────────────────────┐
//!                    │                                               │
//!                    ▼                                               ▼
//!           ┌──────────────┐                                ┌──────────────┐
//!           │ ClientMemory │                                │  EventSink   │
//!           │ (diff+store) │                                │  (dispatch)  │
//!           └──────────────┘                                └──────────────┘
//! ```
//!
//! ## Cycle Flow
//!
//! 1. Lock ClientMemory for the whole cycle
//! 2. Fetch the client table (failure aborts with memory untouched)
//! 3. For each watched MAC, observe the record and store the result
//! 4. Dispatch the collected transitions
//!
//! ## Operational Constraint
//!
//! Online status is inferred from the uptime counter moving between two
//! polls. The controller must refresh its counters at least as often as
//! the engine polls; otherwise a connected client reads as offline. The
//! engine cannot detect a violation of this.

use std::collections::HashSet;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::WatchConfig;
use crate::error::{Error, Result};
use crate::model::{ClientChangeEvent, ClientSnapshot, MacAddress, WatchList};
use crate::state::{ClientMemory, Observation};
use crate::traits::{ClientSource, EventSink};

/// Per-cycle counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Records returned by the source
    pub records: usize,
    /// Records for MACs not on the watch-list
    pub unwatched: usize,
    /// Repeat records for a MAC already handled this cycle
    pub duplicates: usize,
    /// Watched MACs seen for the first time
    pub baselined: usize,
    /// Watched MACs that got their first status
    pub first_status: usize,
    /// Watched MACs whose status held
    pub unchanged: usize,
    /// Watched MACs whose status flipped
    pub transitions: usize,
    /// Transitions the sink failed to deliver
    pub dispatch_failures: usize,
}

/// Core transition engine
///
/// Owns the watch-list and ClientMemory. Memory is behind an async mutex
/// held for the full duration of [`TransitionEngine::run_cycle`], so
/// concurrent callers serialize and each MAC's read-modify-write is atomic.
///
/// ## Lifecycle
///
/// 1. Create with [`TransitionEngine::new()`]
/// 2. Seed baselines with [`TransitionEngine::seed()`]
/// 3. Wait one poll interval
/// 4. Call [`TransitionEngine::run_cycle()`] once per interval
pub struct TransitionEngine {
    /// Controller client table
    source: Box<dyn ClientSource>,

    /// Where transitions go
    sink: Box<dyn EventSink>,

    /// MACs of interest
    watch_list: WatchList,

    /// Per-MAC belief, only touched while the lock is held
    memory: Mutex<ClientMemory>,
}

impl TransitionEngine {
    /// Create a new engine with empty memory
    pub fn new(
        source: Box<dyn ClientSource>,
        sink: Box<dyn EventSink>,
        watch_list: WatchList,
    ) -> Self {
        Self {
            source,
            sink,
            watch_list,
            memory: Mutex::new(ClientMemory::new()),
        }
    }

    /// Create an engine from validated configuration
    pub fn from_config(
        source: Box<dyn ClientSource>,
        sink: Box<dyn EventSink>,
        config: &WatchConfig,
    ) -> Result<Self> {
        config.validate()?;
        let watch_list = config.watch_list()?;
        Ok(Self::new(source, sink, watch_list))
    }

    pub fn watch_list(&self) -> &WatchList {
        &self.watch_list
    }

    /// Seed uptime baselines from an initial poll
    ///
    /// Every watched MAC present in the table gets a baseline with no
    /// status. Watched MACs that are absent get nothing yet.
    ///
    /// # Returns
    ///
    /// - `Ok(usize)`: Number of watched MACs baselined
    /// - `Err(Error::SourceUnavailable)`: Seeding poll failed
    pub async fn seed(&self) -> Result<usize> {
        let mut memory = self.memory.lock().await;
        let clients = self.fetch().await?;

        let mut seeded = HashSet::new();
        for client in clients.iter().filter(|c| self.watch_list.contains(&c.mac)) {
            if seeded.insert(client.mac.clone()) {
                debug!(
                    "Baseline for {} ({}): uptime {:?}",
                    client.mac,
                    self.alias_or_dash(&client.mac),
                    client.uptime
                );
                memory.seed(client);
            }
        }

        info!(
            "Seeded {} of {} watched client(s) from {} record(s)",
            seeded.len(),
            self.watch_list.len(),
            clients.len()
        );

        Ok(seeded.len())
    }

    /// Run one poll-diff-dispatch cycle
    ///
    /// # Returns
    ///
    /// - `Ok(CycleSummary)`: Cycle completed (including when nothing changed)
    /// - `Err(Error::SourceUnavailable)`: Fetch failed; memory untouched, no events
    pub async fn run_cycle(&self) -> Result<CycleSummary> {
        let mut memory = self.memory.lock().await;
        let clients = self.fetch().await?;

        let mut summary = CycleSummary {
            records: clients.len(),
            ..CycleSummary::default()
        };
        let mut handled = HashSet::new();
        let mut pending = Vec::new();

        for client in clients {
            if !self.watch_list.contains(&client.mac) {
                summary.unwatched += 1;
                continue;
            }

            if !handled.insert(client.mac.clone()) {
                debug!("Ignoring repeat record for {} in this cycle", client.mac);
                summary.duplicates += 1;
                continue;
            }

            let observation = memory.observe(&client);
            self.log_observation(&client, observation);

            match observation {
                Observation::Baseline => summary.baselined += 1,
                Observation::FirstStatus { .. } => summary.first_status += 1,
                Observation::Unchanged { .. } => summary.unchanged += 1,
                Observation::Transition { online, .. } => {
                    info!("New client {} online status: {}", client.mac, online);
                    summary.transitions += 1;
                    let alias = self.watch_list.alias(&client.mac).map(str::to_owned);
                    pending.push(ClientChangeEvent::new(alias, online, client));
                }
            }
        }

        // Memory is fully updated at this point; dispatch under the same
        // lock so events from consecutive cycles cannot interleave.
        for event in &pending {
            if let Err(e) = self.sink.dispatch(event).await {
                warn!(
                    "Failed to dispatch {} event for {} via {}: {}",
                    event.kind(),
                    event.mac,
                    self.sink.sink_name(),
                    e
                );
                summary.dispatch_failures += 1;
            }
        }

        debug!("Cycle complete: {:?}", summary);
        Ok(summary)
    }

    /// Copy of the current memory
    pub async fn memory_snapshot(&self) -> ClientMemory {
        self.memory.lock().await.clone()
    }

    async fn fetch(&self) -> Result<Vec<ClientSnapshot>> {
        self.source.fetch_clients().await.map_err(|e| match e {
            Error::SourceUnavailable(_) => e,
            other => Error::source_unavailable(format!(
                "{}: {}",
                self.source.source_name(),
                other
            )),
        })
    }

    fn log_observation(&self, client: &ClientSnapshot, observation: Observation) {
        let alias = self.alias_or_dash(&client.mac);
        match observation {
            Observation::Baseline => {
                debug!(
                    "First sight of {} ({}): baseline uptime {:?}",
                    client.mac, alias, client.uptime
                );
            }
            Observation::FirstStatus {
                online,
                previous_uptime,
            }
            | Observation::Unchanged {
                online,
                previous_uptime,
            }
            | Observation::Transition {
                online,
                previous_uptime,
            } => {
                if online {
                    debug!(
                        "Client {} ({}) updated uptime from {:?} to {:?} - ONLINE",
                        client.mac, alias, previous_uptime, client.uptime
                    );
                } else {
                    debug!(
                        "Client {} ({}) uptime remained the same: {:?} to {:?} - OFFLINE",
                        client.mac, alias, previous_uptime, client.uptime
                    );
                }
            }
        }
    }

    fn alias_or_dash(&self, mac: &MacAddress) -> &str {
        self.watch_list.alias(mac).unwrap_or("-")
    }
}
