// # Memory Client Store
//
// In-memory record of what the engine last saw for each watched MAC.
//
// ## Purpose
//
// Holds the uptime baseline and the last computed status per MAC so the
// next poll can be diffed against it. Entries are created on first sight
// and never removed; a client that drops out of the controller's table
// keeps its last entry until it reappears.
//
// ## Crash Behavior
//
// - All state is lost on restart
// - After a restart every watched MAC starts over from a baseline, so no
//   events are emitted until two further polls have observed it
//
// ## Status Lifecycle
//
// ```text
// Unknown ──first sight──▶ Baseline(uptime) ──next sight──▶ Online | Offline
//                                                             ▲        │
//                                                             └────────┘
// ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::model::{ClientSnapshot, MacAddress};

/// What the engine believes about one client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEntry {
    /// Uptime seen on the most recent poll
    pub uptime: Option<u64>,

    /// Last computed status, `None` while only a baseline exists
    pub online: Option<bool>,

    /// When this entry was last written
    pub last_seen: DateTime<Utc>,
}

impl MemoryEntry {
    fn baseline(uptime: Option<u64>, now: DateTime<Utc>) -> Self {
        Self {
            uptime,
            online: None,
            last_seen: now,
        }
    }

    /// Whether this entry only holds an uptime baseline
    pub fn is_baseline(&self) -> bool {
        self.online.is_none()
    }
}

/// Outcome of comparing one snapshot record against memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// First sight of this MAC; only an uptime baseline was stored
    Baseline,

    /// First comparison for this MAC; status stored without an event
    FirstStatus {
        online: bool,
        previous_uptime: Option<u64>,
    },

    /// Status matches the stored one; uptime refreshed
    Unchanged {
        online: bool,
        previous_uptime: Option<u64>,
    },

    /// Status differs from the stored one
    Transition {
        online: bool,
        previous_uptime: Option<u64>,
    },
}

impl Observation {
    /// The status computed on this observation, if any
    pub fn online(&self) -> Option<bool> {
        match *self {
            Observation::Baseline => None,
            Observation::FirstStatus { online, .. }
            | Observation::Unchanged { online, .. }
            | Observation::Transition { online, .. } => Some(online),
        }
    }

    pub fn is_transition(&self) -> bool {
        matches!(self, Observation::Transition { .. })
    }
}

/// Per-MAC memory owned by a single engine
#[derive(Debug, Clone, Default)]
pub struct ClientMemory {
    entries: HashMap<MacAddress, MemoryEntry>,
}

impl ClientMemory {
    /// Create an empty memory
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an uptime-only baseline for a client
    ///
    /// Used when seeding from the initial snapshot. Any existing entry is
    /// replaced.
    pub fn seed(&mut self, snapshot: &ClientSnapshot) {
        self.entries.insert(
            snapshot.mac.clone(),
            MemoryEntry::baseline(snapshot.uptime, Utc::now()),
        );
    }

    /// Compare a fresh record against memory and store the result
    ///
    /// A client counts as online when its uptime moved since the previous
    /// poll. The entry is rewritten on every call, including when the
    /// status is unchanged, so the next comparison is against this poll's
    /// uptime.
    pub fn observe(&mut self, snapshot: &ClientSnapshot) -> Observation {
        let now = Utc::now();

        let Some(entry) = self.entries.get_mut(&snapshot.mac) else {
            self.seed(snapshot);
            return Observation::Baseline;
        };

        let previous_uptime = entry.uptime;
        let online = snapshot.uptime != previous_uptime;

        let observation = match entry.online {
            None => Observation::FirstStatus {
                online,
                previous_uptime,
            },
            Some(stored) if stored != online => Observation::Transition {
                online,
                previous_uptime,
            },
            Some(_) => Observation::Unchanged {
                online,
                previous_uptime,
            },
        };

        entry.uptime = snapshot.uptime;
        entry.online = Some(online);
        entry.last_seen = now;

        observation
    }

    pub fn get(&self, mac: &MacAddress) -> Option<&MemoryEntry> {
        self.entries.get(mac)
    }

    pub fn contains(&self, mac: &MacAddress) -> bool {
        self.entries.contains_key(mac)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// MACs that currently have an entry
    pub fn macs(&self) -> impl Iterator<Item = &MacAddress> {
        self.entries.keys()
    }
}
