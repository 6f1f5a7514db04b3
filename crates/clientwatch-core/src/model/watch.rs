use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::model::MacAddress;

/// A MAC address the operator wants transitions for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEntry {
    pub mac: MacAddress,
    pub alias: Option<String>,
}

impl WatchEntry {
    pub fn new(mac: MacAddress, alias: Option<String>) -> Self {
        Self { mac, alias }
    }
}

/// Ordered, immutable set of watched clients
///
/// Keeps configuration order for display and a MAC index for the
/// per-record lookups the engine does every cycle.
#[derive(Debug, Clone, Default)]
pub struct WatchList {
    entries: Vec<WatchEntry>,
    index: HashMap<MacAddress, usize>,
}

impl WatchList {
    /// Build a watch-list, rejecting duplicate MACs
    pub fn new(entries: Vec<WatchEntry>) -> Result<Self> {
        let mut index = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            if index.insert(entry.mac.clone(), position).is_some() {
                return Err(Error::config(format!(
                    "MAC {} is listed more than once in clients_to_watch",
                    entry.mac
                )));
            }
        }

        Ok(Self { entries, index })
    }

    pub fn contains(&self, mac: &MacAddress) -> bool {
        self.index.contains_key(mac)
    }

    pub fn get(&self, mac: &MacAddress) -> Option<&WatchEntry> {
        self.index.get(mac).and_then(|&i| self.entries.get(i))
    }

    /// Alias for a watched MAC, `None` if unwatched or unaliased
    pub fn alias(&self, mac: &MacAddress) -> Option<&str> {
        self.get(mac).and_then(|entry| entry.alias.as_deref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WatchEntry> {
        self.entries.iter()
    }
}
