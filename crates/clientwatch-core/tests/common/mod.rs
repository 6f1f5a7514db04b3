//! Test doubles and common utilities for engine contract tests
//!
//! This module provides a scripted client source and a recording sink so
//! tests can drive the engine poll by poll and inspect what it dispatched.

#![allow(dead_code)]

use clientwatch_core::TransitionEngine;
use clientwatch_core::error::{Error, Result};
use clientwatch_core::model::{
    ClientChangeEvent, ClientSnapshot, MacAddress, WatchEntry, WatchList,
};
use clientwatch_core::traits::{ClientSource, EventSink};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const LAPTOP: &str = "aa:bb:cc:dd:ee:01";
pub const PHONE: &str = "aa:bb:cc:dd:ee:02";
pub const STRANGER: &str = "de:ad:be:ef:00:01";

/// A ClientSource that replays a script of poll results
///
/// Clones share the script and counters, so a test can keep one clone
/// and hand the other to the engine.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    /// Remaining poll results, consumed front to back
    script: Arc<Mutex<VecDeque<Result<Vec<ClientSnapshot>>>>>,
    /// Call counter for fetch_clients()
    fetch_call_count: Arc<AtomicUsize>,
    /// Fetches currently running
    in_flight: Arc<AtomicUsize>,
    /// Highest value in_flight ever reached
    max_in_flight: Arc<AtomicUsize>,
    /// Simulated round-trip latency
    delay: Option<Duration>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every fetch sleeps this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful poll
    pub fn push_table(&self, table: Vec<ClientSnapshot>) -> &Self {
        self.script.lock().unwrap().push_back(Ok(table));
        self
    }

    /// Queue a failed poll
    pub fn push_failure(&self) -> &Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(Error::source_unavailable("controller unreachable")));
        self
    }

    /// Get the number of times fetch_clients() was called
    pub fn fetch_call_count(&self) -> usize {
        self.fetch_call_count.load(Ordering::SeqCst)
    }

    /// Highest number of fetches that ever overlapped
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Number of queued polls not yet consumed
    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl ClientSource for ScriptedSource {
    async fn fetch_clients(&self) -> Result<Vec<ClientSnapshot>> {
        self.fetch_call_count.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::source_unavailable("script exhausted")));

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// An EventSink that records everything it is given
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<ClientChangeEvent>>>,
    /// When set, every dispatch fails after recording
    failing: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose dispatches always fail
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Events dispatched so far
    pub fn dispatched(&self) -> Vec<ClientChangeEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn dispatch_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl EventSink for RecordingSink {
    async fn dispatch(&self, event: &ClientChangeEvent) -> Result<()> {
        self.events.lock().unwrap().push(event.clone());
        if self.failing {
            return Err(Error::sink("recording sink set to fail"));
        }
        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "recording"
    }
}

pub fn mac(s: &str) -> MacAddress {
    MacAddress::parse(s).unwrap()
}

/// A client record with a hostname attribute
pub fn client(mac_str: &str, uptime: u64) -> ClientSnapshot {
    ClientSnapshot::new(mac(mac_str), Some(uptime))
        .with_attribute("hostname", format!("host-{}", &mac_str[15..]))
}

/// Watch-list of the laptop (aliased) and the phone (no alias)
pub fn default_watch_list() -> WatchList {
    WatchList::new(vec![
        WatchEntry::new(mac(LAPTOP), Some("laptop".to_string())),
        WatchEntry::new(mac(PHONE), None),
    ])
    .unwrap()
}

/// Engine over clones of the given doubles
pub fn engine_with(source: &ScriptedSource, sink: &RecordingSink) -> TransitionEngine {
    TransitionEngine::new(
        Box::new(source.clone()),
        Box::new(sink.clone()),
        default_watch_list(),
    )
}
