// # Event Sink Trait
//
// Defines the interface for delivering client transition events.
//
// ## Implementations
//
// - Bounded in-process channel: [`crate::sink::ChannelSink`]
// - HTTP webhook: `clientwatch-webhook` crate
// - Stdout JSON lines: `clientwatchd`

use async_trait::async_trait;

use crate::model::ClientChangeEvent;

/// Trait for event sink implementations
///
/// The engine calls [`EventSink::dispatch`] at most once per watched MAC
/// per cycle, and only after the cycle's memory update has completed.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform I/O to deliver the event
///
/// ## Forbidden Capabilities
/// - ❌ Retry internally (a failed dispatch is logged by the engine and dropped)
/// - ❌ Block indefinitely (bound every network call with a timeout)
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one event
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Delivered (or accepted for delivery)
    /// - `Err(Error::Sink)`: Delivery failed
    async fn dispatch(&self, event: &ClientChangeEvent) -> Result<(), crate::Error>;

    /// Short name used in logs
    fn sink_name(&self) -> &'static str;
}
