// # Client Snapshot
//
// One record of a controller's client table as of a single poll.
//
// Only `mac` and `uptime` take part in transition detection. Every other
// field the controller reports is carried in `attributes` untouched so it
// can ride along in event payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{Error, Result};
use crate::model::MacAddress;

/// A single client as reported by one poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSnapshot {
    /// Client hardware address
    pub mac: MacAddress,

    /// Controller-defined uptime counter for the current session
    ///
    /// Absent when the controller omits the field. An absent value compares
    /// equal to another absent value, i.e. it reads as "not advancing".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,

    /// Pass-through attributes (hostname, ip, essid, ...)
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl ClientSnapshot {
    /// Create a snapshot with no extra attributes
    pub fn new(mac: MacAddress, uptime: Option<u64>) -> Self {
        Self {
            mac,
            uptime,
            attributes: Map::new(),
        }
    }

    /// Attach a pass-through attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Build a snapshot from a raw controller record
    ///
    /// The record must be a JSON object with a parseable `mac`. An `uptime`
    /// that is not a non-negative integer is treated as absent for comparison
    /// but kept verbatim in `attributes`.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut attributes) = value else {
            return Err(Error::malformed_record("record is not a JSON object"));
        };

        let mac = match attributes.remove("mac") {
            Some(Value::String(raw)) => MacAddress::parse(&raw)
                .map_err(|e| Error::malformed_record(e.to_string()))?,
            Some(other) => {
                return Err(Error::malformed_record(format!(
                    "mac is not a string: {}",
                    other
                )));
            }
            None => return Err(Error::malformed_record("record has no mac")),
        };

        let uptime = attributes.get("uptime").and_then(Value::as_u64);
        if uptime.is_some() {
            attributes.remove("uptime");
        }

        Ok(Self {
            mac,
            uptime,
            attributes,
        })
    }

    /// Look up a pass-through attribute as a string
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}

/// Convert a raw controller client table into snapshots
///
/// Malformed records are logged and skipped; one bad record never
/// invalidates the rest of the table.
pub fn parse_snapshot(records: Vec<Value>) -> Vec<ClientSnapshot> {
    let total = records.len();
    let snapshots: Vec<ClientSnapshot> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match ClientSnapshot::from_value(record) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Skipping client record #{}: {}", index, e);
                None
            }
        })
        .collect();

    if snapshots.len() < total {
        warn!(
            "Skipped {} of {} client records",
            total - snapshots.len(),
            total
        );
    }

    snapshots
}
