//! Configuration types for the client watcher
//!
//! This module defines the configuration structures used throughout the crate.
//! Loading (environment, files) is the daemon's concern; everything here is
//! plain serde data with validation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{MacAddress, WatchEntry, WatchList};

/// Main client watcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Controller connection settings
    pub controller: ControllerConfig,

    /// Clients to report transitions for, in display order
    #[serde(default)]
    pub clients_to_watch: Vec<WatchEntryConfig>,

    /// Seconds between polls (also the cooldown after seeding)
    ///
    /// Must not be shorter than the controller's own uptime refresh
    /// interval, or connected clients will read as offline.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl WatchConfig {
    /// Create a configuration with defaults for everything but the controller
    pub fn new(controller: ControllerConfig) -> Self {
        Self {
            controller,
            clients_to_watch: Vec::new(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }

    /// Add a watched client
    pub fn with_client(mut self, mac: impl Into<String>, alias: Option<&str>) -> Self {
        self.clients_to_watch.push(WatchEntryConfig {
            mac: mac.into(),
            alias: alias.map(str::to_owned),
        });
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.controller.validate()?;

        if self.poll_interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }

        // Parses every MAC and rejects duplicates
        self.watch_list()?;

        Ok(())
    }

    /// Build the engine's watch-list
    pub fn watch_list(&self) -> Result<WatchList, crate::Error> {
        let entries = self
            .clients_to_watch
            .iter()
            .map(WatchEntryConfig::to_entry)
            .collect::<Result<Vec<_>, _>>()?;
        WatchList::new(entries)
    }

    /// Poll interval as a duration
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll_interval_secs)
    }
}

/// One configured watch-list entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchEntryConfig {
    /// MAC address in any common notation
    pub mac: String,

    /// Human-readable name used in logs and event payloads
    #[serde(default)]
    pub alias: Option<String>,
}

impl WatchEntryConfig {
    fn to_entry(&self) -> Result<WatchEntry, crate::Error> {
        let mac = MacAddress::parse(&self.mac)
            .map_err(|e| crate::Error::config(format!("clients_to_watch: {}", e)))?;
        let alias = self
            .alias
            .as_ref()
            .map(|a| a.trim().to_owned())
            .filter(|a| !a.is_empty());
        Ok(WatchEntry::new(mac, alias))
    }
}

/// Controller API flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerPlatform {
    /// Standalone Network Application (`/api/login`, `/api/s/{site}/...`)
    #[default]
    Classic,
    /// UniFi OS console (`/api/auth/login`, `/proxy/network/api/s/{site}/...`)
    UnifiOs,
}

impl ControllerPlatform {
    /// Session login path
    pub fn login_path(&self) -> &'static str {
        match self {
            ControllerPlatform::Classic => "/api/login",
            ControllerPlatform::UnifiOs => "/api/auth/login",
        }
    }

    /// Prefix in front of `/api/s/{site}/...`
    pub fn api_prefix(&self) -> &'static str {
        match self {
            ControllerPlatform::Classic => "",
            ControllerPlatform::UnifiOs => "/proxy/network",
        }
    }
}

impl std::str::FromStr for ControllerPlatform {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "classic" => Ok(ControllerPlatform::Classic),
            "unifi_os" | "unifios" => Ok(ControllerPlatform::UnifiOs),
            other => Err(crate::Error::config(format!(
                "Unknown controller platform '{}' (expected classic or unifi_os)",
                other
            ))),
        }
    }
}

/// Controller connection settings
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the password.
#[derive(Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Controller hostname or IP
    pub hostname: String,

    /// Controller HTTPS port
    pub port: u16,

    /// Login username
    pub username: String,

    /// Login password
    /// ⚠️ NEVER log this value
    pub password: String,

    /// Site whose clients are polled
    #[serde(default = "default_site")]
    pub site: String,

    /// API flavor
    #[serde(default)]
    pub platform: ControllerPlatform,

    /// Verify the controller's TLS certificate
    ///
    /// Off by default: controllers ship with self-signed certificates.
    #[serde(default)]
    pub verify_tls: bool,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl fmt::Debug for ControllerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerConfig")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("site", &self.site)
            .field("platform", &self.platform)
            .field("verify_tls", &self.verify_tls)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ControllerConfig {
    /// Create controller settings with defaults for the optional fields
    pub fn new(
        hostname: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            port,
            username: username.into(),
            password: password.into(),
            site: default_site(),
            platform: ControllerPlatform::default(),
            verify_tls: false,
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Validate the controller configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.hostname.trim().is_empty() {
            return Err(crate::Error::config("Controller hostname cannot be empty"));
        }
        if self.port == 0 {
            return Err(crate::Error::config("Controller port must be > 0"));
        }
        if self.username.is_empty() {
            return Err(crate::Error::config("Controller username cannot be empty"));
        }
        if self.password.is_empty() {
            return Err(crate::Error::config("Controller password cannot be empty"));
        }
        if self.site.trim().is_empty() {
            return Err(crate::Error::config("Controller site cannot be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Controller timeout must be > 0"));
        }
        Ok(())
    }

    /// `https://host:port` without a trailing slash
    pub fn base_url(&self) -> String {
        format!("https://{}:{}", self.hostname, self.port)
    }
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_site() -> String {
    "default".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}
