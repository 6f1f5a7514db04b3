// # Client Change Event
//
// A single event kind is dispatched for both directions of a transition;
// the `online` flag carries the new status. `kind()` derives the direction
// for logging and consumers that want to branch on it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{ClientSnapshot, MacAddress};

/// Trigger name under which every transition is dispatched
pub const CLIENT_CHANGE_TRIGGER: &str = "unifi.ClientChange";

/// Direction of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    BecameOnline,
    BecameOffline,
}

impl EventKind {
    /// Direction for a newly computed status
    pub fn from_online(online: bool) -> Self {
        if online {
            EventKind::BecameOnline
        } else {
            EventKind::BecameOffline
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::BecameOnline => f.write_str("became-online"),
            EventKind::BecameOffline => f.write_str("became-offline"),
        }
    }
}

/// Payload dispatched when a watched client's status flips
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientChangeEvent {
    /// The client that transitioned
    pub mac: MacAddress,

    /// Operator-supplied alias from the watch-list, if any
    pub alias: Option<String>,

    /// New status
    pub online: bool,

    /// The full controller record that produced the transition
    pub client_info: ClientSnapshot,

    /// When the engine observed the transition
    pub observed_at: DateTime<Utc>,
}

impl ClientChangeEvent {
    /// Create an event stamped with the current time
    pub fn new(alias: Option<String>, online: bool, client_info: ClientSnapshot) -> Self {
        Self {
            mac: client_info.mac.clone(),
            alias,
            online,
            client_info,
            observed_at: Utc::now(),
        }
    }

    /// Direction of this transition
    pub fn kind(&self) -> EventKind {
        EventKind::from_online(self.online)
    }

    /// Trigger name this event is dispatched under
    pub fn trigger(&self) -> &'static str {
        CLIENT_CHANGE_TRIGGER
    }

    /// Alias if known, otherwise the MAC
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(self.mac.as_str())
    }
}
