//! Core traits for the client watcher
//!
//! This module defines the abstract interfaces the engine talks through.
//!
//! - [`ClientSource`]: Fetch the controller's current client table
//! - [`EventSink`]: Deliver transition events

pub mod client_source;
pub mod event_sink;

pub use client_source::ClientSource;
pub use event_sink::EventSink;
