// # Client Source Trait
//
// Defines the interface for fetching a controller's client table.
//
// ## Implementations
//
// - UniFi controller (session login + `stat/sta`): `clientwatch-unifi` crate
//
// ## Usage
//
// ```rust,ignore
// use clientwatch_core::ClientSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* ClientSource implementation */;
//
//     for client in source.fetch_clients().await? {
//         println!("{} uptime={:?}", client.mac, client.uptime);
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::model::ClientSnapshot;

/// Trait for controller client-table sources
///
/// Each call is a self-contained round trip: authenticate, fetch, parse.
/// Sources keep no state between calls and never interpret uptime.
///
/// # Trust Level: Semi-Trusted
///
/// ## Allowed Capabilities
/// - ✅ Perform network I/O against the configured controller
/// - ✅ Drop records it cannot parse (see [`crate::parse_snapshot`])
///
/// ## Forbidden Capabilities
/// - ❌ Filter by watch-list (owned by `TransitionEngine`)
/// - ❌ Touch `ClientMemory` or decide online/offline status
/// - ❌ Retry on failure (the scheduler retries on its next tick)
/// - ❌ Log credentials
#[async_trait]
pub trait ClientSource: Send + Sync {
    /// Fetch the current client table
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<ClientSnapshot>)`: Every well-formed client record
    /// - `Err(Error::SourceUnavailable)`: Network, authentication or parse failure
    async fn fetch_clients(&self) -> Result<Vec<ClientSnapshot>, crate::Error>;

    /// Short name used in logs
    fn source_name(&self) -> &'static str;
}
