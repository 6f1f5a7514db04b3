// # Event Sink Implementations
//
// Sinks that ship with the core library. Network sinks live in their own
// crates.

pub mod channel;

pub use channel::{ChannelSink, EventStream};
