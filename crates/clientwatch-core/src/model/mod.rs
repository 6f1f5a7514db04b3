//! Domain types shared by the engine, sources and sinks
//!
//! - [`MacAddress`]: canonical lowercase colon-separated hardware address
//! - [`WatchList`]: operator-configured MACs of interest with optional aliases
//! - [`ClientSnapshot`]: one controller record from a poll
//! - [`ClientChangeEvent`]: the single event kind dispatched on a transition

pub mod event;
pub mod mac;
pub mod snapshot;
pub mod watch;

pub use event::{CLIENT_CHANGE_TRIGGER, ClientChangeEvent, EventKind};
pub use mac::MacAddress;
pub use snapshot::{ClientSnapshot, parse_snapshot};
pub use watch::{WatchEntry, WatchList};
