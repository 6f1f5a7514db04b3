// # Webhook Event Sink
//
// Delivers each client transition as one HTTP POST:
//
// ```json
// { "trigger": "unifi.ClientChange", "payload": { "mac": "...", "online": true, ... } }
// ```
//
// ## Trust Level: Untrusted
//
// - ✅ One request per event, bounded by the configured timeout
// - ✅ Any non-2xx status or transport error maps to `Error::Sink`
// - ❌ NO retry logic (the engine logs the failure and moves on)
// - ❌ NO queueing (a slow endpoint delays the cycle, never piles up events)

use std::time::Duration;

use async_trait::async_trait;
use clientwatch_core::model::ClientChangeEvent;
use clientwatch_core::traits::EventSink;
use clientwatch_core::{Error, Result};
use reqwest::Url;
use serde::Serialize;
use tracing::debug;

const USER_AGENT: &str = concat!("clientwatch/", env!("CARGO_PKG_VERSION"));

/// Wire envelope for one event
#[derive(Debug, Serialize)]
struct WebhookBody<'a> {
    trigger: &'static str,
    payload: &'a ClientChangeEvent,
}

/// Event sink that POSTs JSON to a fixed URL
#[derive(Debug, Clone)]
pub struct WebhookSink {
    url: Url,
    client: reqwest::Client,
}

impl WebhookSink {
    /// Create a webhook sink
    ///
    /// # Returns
    ///
    /// - `Err(Error::Config)`: URL unparseable or not http(s)
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| Error::config(format!("Invalid webhook URL '{}': {}", url, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::config(format!(
                "Webhook URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { url, client })
    }

    /// Endpoint events are POSTed to
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl EventSink for WebhookSink {
    async fn dispatch(&self, event: &ClientChangeEvent) -> Result<()> {
        let body = WebhookBody {
            trigger: event.trigger(),
            payload: event,
        };

        let response = self
            .client
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::sink(format!("Webhook request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::sink(format!("Webhook returned HTTP {}", status)));
        }

        debug!("Delivered {} event for {} to webhook", event.kind(), event.mac);
        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "webhook"
    }
}
