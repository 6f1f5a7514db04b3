//! Engine Contract Test: Failure Isolation
//!
//! This test verifies that failures stay contained.
//!
//! Constraints verified:
//! - A failed fetch aborts the cycle with memory untouched and no events
//! - A failed seed is fatal to startup
//! - One malformed controller record does not spoil the rest of the table
//! - A failing sink does not roll back memory or cause re-emission
//!
//! If this test fails, a transient upstream problem can corrupt the
//! engine's history.

mod common;

use clientwatch_core::error::{Error, Result};
use clientwatch_core::model::{ClientSnapshot, parse_snapshot};
use clientwatch_core::traits::ClientSource;
use clientwatch_core::{Poller, TransitionEngine};
use common::*;
use serde_json::{Value, json};
use std::sync::Mutex;
use std::time::Duration;

#[tokio::test]
async fn failed_fetch_leaves_memory_untouched() {
    let source = ScriptedSource::new();
    let sink = RecordingSink::new();
    let engine = engine_with(&source, &sink);

    source
        .push_table(vec![client(LAPTOP, 100)])
        .push_table(vec![client(LAPTOP, 150)]);
    source.push_failure();
    source.push_table(vec![client(LAPTOP, 150)]);

    engine.run_cycle().await.unwrap();
    engine.run_cycle().await.unwrap();
    let before = engine.memory_snapshot().await;

    let err = engine.run_cycle().await.expect_err("fetch fails");
    assert!(matches!(err, Error::SourceUnavailable(_)));

    let after = engine.memory_snapshot().await;
    assert_eq!(before.get(&mac(LAPTOP)), after.get(&mac(LAPTOP)));
    assert_eq!(sink.dispatch_count(), 0);

    // The next good poll compares against the pre-failure entry
    engine.run_cycle().await.unwrap();
    let events = sink.dispatched();
    assert_eq!(events.len(), 1);
    assert!(!events[0].online);
}

#[tokio::test]
async fn failed_seed_is_fatal_to_startup() {
    let source = ScriptedSource::new();
    let sink = RecordingSink::new();
    source.push_failure();

    let result = Poller::start(engine_with(&source, &sink), Duration::from_secs(30)).await;

    assert!(matches!(result, Err(Error::SourceUnavailable(_))));
    assert_eq!(source.fetch_call_count(), 1, "no retry at startup");
}

#[tokio::test]
async fn zero_interval_is_rejected() {
    let source = ScriptedSource::new();
    let sink = RecordingSink::new();
    source.push_table(vec![]);

    let result = Poller::start(engine_with(&source, &sink), Duration::ZERO).await;

    assert!(matches!(result, Err(Error::Config(_))));
    assert_eq!(source.fetch_call_count(), 0);
}

/// A source that hands raw controller JSON through `parse_snapshot`
struct RawTableSource {
    tables: Mutex<Vec<Vec<Value>>>,
}

#[async_trait::async_trait]
impl ClientSource for RawTableSource {
    async fn fetch_clients(&self) -> Result<Vec<ClientSnapshot>> {
        let table = self.tables.lock().unwrap().remove(0);
        Ok(parse_snapshot(table))
    }

    fn source_name(&self) -> &'static str {
        "raw"
    }
}

#[tokio::test]
async fn malformed_record_is_skipped_not_fatal() {
    let table = |uptime: u64| {
        vec![
            json!({ "hostname": "no-mac-here", "uptime": 3 }),
            json!({ "mac": LAPTOP, "uptime": uptime }),
            json!({ "mac": "zz:zz:zz:zz:zz:zz" }),
        ]
    };
    let source = RawTableSource {
        tables: Mutex::new(vec![table(100), table(150), table(150)]),
    };
    let sink = RecordingSink::new();
    let engine = TransitionEngine::new(
        Box::new(source),
        Box::new(sink.clone()),
        default_watch_list(),
    );

    for _ in 0..3 {
        let summary = engine.run_cycle().await.expect("bad records do not abort");
        assert_eq!(summary.records, 1);
    }

    let events = sink.dispatched();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].mac, mac(LAPTOP));
}

#[tokio::test]
async fn failing_sink_does_not_roll_back_or_re_emit() {
    let source = ScriptedSource::new();
    let sink = RecordingSink::failing();
    let engine = engine_with(&source, &sink);

    for uptime in [100, 150, 150, 150] {
        source.push_table(vec![client(LAPTOP, uptime)]);
    }

    engine.run_cycle().await.unwrap();
    engine.run_cycle().await.unwrap();

    let summary = engine.run_cycle().await.expect("sink failure is not a cycle failure");
    assert_eq!(summary.transitions, 1);
    assert_eq!(summary.dispatch_failures, 1);

    let memory = engine.memory_snapshot().await;
    assert_eq!(memory.get(&mac(LAPTOP)).unwrap().online, Some(false));

    // Status already stored as offline: no second attempt
    engine.run_cycle().await.unwrap();
    assert_eq!(sink.dispatch_count(), 1);
}
