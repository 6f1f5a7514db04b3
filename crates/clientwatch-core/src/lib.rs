// # clientwatch-core
//
// Core library for the wireless client presence watcher.
//
// ## Architecture Overview
//
// This library turns periodically polled controller client tables into
// discrete online/offline transition events:
// - **ClientSource**: Trait for fetching the controller's current client table
// - **EventSink**: Trait for delivering transition events
// - **TransitionEngine**: Diffs each snapshot against ClientMemory and emits transitions
// - **ClientMemory**: Per-MAC record of last uptime and last computed status
// - **Poller**: Fixed-interval scheduler that drives the engine without overlapping cycles
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Controller I/O and event delivery live behind traits
// 2. **Owned State**: ClientMemory belongs to one engine instance, no globals
// 3. **Library-First**: The daemon is a thin wiring layer over this crate
// 4. **Conservative Transitions**: No event until a MAC has a stored status to compare against

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod scheduler;
pub mod sink;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use config::{ControllerConfig, ControllerPlatform, WatchConfig, WatchEntryConfig};
pub use engine::{CycleSummary, TransitionEngine};
pub use error::{Error, Result};
pub use model::{
    CLIENT_CHANGE_TRIGGER, ClientChangeEvent, ClientSnapshot, EventKind, MacAddress, WatchEntry,
    WatchList, parse_snapshot,
};
pub use scheduler::Poller;
pub use sink::{ChannelSink, EventStream};
pub use state::{ClientMemory, MemoryEntry, Observation};
pub use traits::{ClientSource, EventSink};
