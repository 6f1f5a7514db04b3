// # UniFi Client Source
//
// This crate provides a UniFi Network controller implementation of
// `ClientSource` for the client watcher.
//
// ## Round Trip
//
// Every `fetch_clients()` call is self-contained:
//
// 1. Build a fresh HTTP client with an empty cookie jar
// 2. `POST {login_path}` with `{"username", "password"}` (session cookie lands in the jar)
// 3. `GET {api_prefix}/api/s/{site}/stat/sta`
// 4. Unwrap the `{ meta: { rc, msg }, data: [...] }` envelope
// 5. Convert records with `parse_snapshot` (malformed records are skipped)
//
// | platform | login | client table |
// |---|---|---|
// | classic | `/api/login` | `/api/s/{site}/stat/sta` |
// | unifi_os | `/api/auth/login` | `/proxy/network/api/s/{site}/stat/sta` |
//
// Nothing is cached between calls, so a controller restart or an expired
// session never leaves the source in a bad state.
//
// ## Security Requirements
//
// - The password NEVER appears in logs or error messages
// - TLS verification is off unless `verify_tls` is set (controllers ship
//   self-signed certificates)
//
// ## Trust Level: Semi-Trusted
//
// - ✅ Talks to the configured controller only
// - ❌ NO retry logic (the poller retries on its next tick)
// - ❌ NO watch-list filtering (owned by TransitionEngine)

use async_trait::async_trait;
use clientwatch_core::config::ControllerConfig;
use clientwatch_core::model::{ClientSnapshot, parse_snapshot};
use clientwatch_core::traits::ClientSource;
use clientwatch_core::{Error, Result};
use reqwest::Url;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("clientwatch/", env!("CARGO_PKG_VERSION"));

/// Legacy API response envelope
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    meta: Option<EnvelopeMeta>,
    #[serde(default)]
    data: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeMeta {
    rc: String,
    #[serde(default)]
    msg: Option<String>,
}

/// UniFi controller client source
///
/// # Security
///
/// Holds the controller password; the Debug implementation of the
/// underlying [`ControllerConfig`] redacts it.
#[derive(Debug)]
pub struct UnifiSource {
    /// Controller root (`https://host:port`)
    base_url: Url,

    /// Credentials, site and transport settings
    config: ControllerConfig,
}

impl UnifiSource {
    /// Create a source for `https://{hostname}:{port}`
    pub fn new(config: ControllerConfig) -> Result<Self> {
        let base_url = config.base_url();
        Self::with_base_url(&base_url, config)
    }

    /// Create a source against an explicit controller root
    ///
    /// Lets tests point the source at a plain-HTTP mock server.
    pub fn with_base_url(base_url: &str, config: ControllerConfig) -> Result<Self> {
        config.validate()?;

        let base_url = Url::parse(base_url)
            .map_err(|e| Error::config(format!("Invalid controller URL '{}': {}", base_url, e)))?;

        Ok(Self { base_url, config })
    }

    /// Session login URL for the configured platform
    pub fn login_url(&self) -> Result<Url> {
        self.join(self.config.platform.login_path())
    }

    /// Client table URL for the configured platform and site
    pub fn clients_url(&self) -> Result<Url> {
        let path = format!(
            "{}/api/s/{}/stat/sta",
            self.config.platform.api_prefix(),
            self.config.site
        );
        self.join(&path)
    }

    fn join(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::config(format!("Invalid controller path '{}': {}", path, e)))
    }

    /// Build a client with a fresh cookie jar for one round trip
    fn session_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .danger_accept_invalid_certs(!self.config.verify_tls)
            .build()
            .map_err(|e| Error::source_unavailable(format!("Failed to build HTTP client: {}", e)))
    }

    /// Authenticate the session held by `http`
    async fn login(&self, http: &reqwest::Client) -> Result<()> {
        let url = self.login_url()?;
        debug!("Logging in to {} as {}", url, self.config.username);

        let body = json!({
            "username": self.config.username,
            "password": self.config.password,
        });

        let response = http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::source_unavailable(format!("Login request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::source_unavailable(format!(
                "Login rejected (HTTP {})",
                status
            )));
        }

        Ok(())
    }

    /// Fetch the raw client table with an authenticated session
    async fn list_clients(&self, http: &reqwest::Client) -> Result<Vec<Value>> {
        let url = self.clients_url()?;
        debug!("GET {}", url);

        let response = http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::source_unavailable(format!("Client table request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::source_unavailable(
                "Client table request unauthorized (session not established)",
            ));
        }
        if !status.is_success() {
            return Err(Error::source_unavailable(format!(
                "Client table request failed (HTTP {})",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::source_unavailable(format!("Failed to read response: {}", e)))?;

        parse_envelope(&body)
    }
}

/// Unwrap `data` from a legacy envelope, failing on `meta.rc != "ok"`
fn parse_envelope(body: &str) -> Result<Vec<Value>> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| Error::source_unavailable(format!("Unparseable client table: {}", e)))?;

    match envelope.meta {
        Some(meta) if meta.rc != "ok" => Err(Error::source_unavailable(format!(
            "Controller returned rc={}: {}",
            meta.rc,
            meta.msg.unwrap_or_default()
        ))),
        _ => Ok(envelope.data),
    }
}

#[async_trait]
impl ClientSource for UnifiSource {
    async fn fetch_clients(&self) -> Result<Vec<ClientSnapshot>> {
        let http = self.session_client()?;

        self.login(&http).await?;
        let records = self.list_clients(&http).await?;

        debug!("Controller reported {} client record(s)", records.len());
        Ok(parse_snapshot(records))
    }

    fn source_name(&self) -> &'static str {
        "unifi"
    }
}
