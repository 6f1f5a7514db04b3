// # clientwatchd - Client Presence Daemon
//
// This is a THIN integration layer over clientwatch-core:
// - DO NOT add transition logic here (owned by TransitionEngine)
// - DO NOT add scheduling logic here (owned by Poller)
// - Configuration is via environment variables ONLY
//
// The daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Wiring the UniFi source and the configured event sink into an engine
// 4. Seeding, polling, and stopping on SIGTERM/SIGINT
//
// ## Configuration
//
// ### Controller (required)
// - `CLIENTWATCH_HOSTNAME`: Controller host
// - `CLIENTWATCH_PORT`: Controller HTTPS port
// - `CLIENTWATCH_USERNAME`: Login username
// - `CLIENTWATCH_PASSWORD`: Login password
//
// ### Controller (optional)
// - `CLIENTWATCH_SITE`: Site name (default: `default`)
// - `CLIENTWATCH_PLATFORM`: `classic` or `unifi_os` (default: `classic`)
// - `CLIENTWATCH_VERIFY_TLS`: Verify the controller certificate (default: false)
//
// ### Watch-list
// - `CLIENTWATCH_CLIENTS`: Comma-separated `mac[=alias]` entries
//
// ### Polling and delivery
// - `CLIENTWATCH_POLL_INTERVAL`: Seconds between polls, 1..=3600 (default: 30)
// - `CLIENTWATCH_WEBHOOK_URL`: POST events here instead of printing them
// - `CLIENTWATCH_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export CLIENTWATCH_HOSTNAME=unifi.local
// export CLIENTWATCH_PORT=8443
// export CLIENTWATCH_USERNAME=admin
// export CLIENTWATCH_PASSWORD=secret
// export CLIENTWATCH_CLIENTS="aa:bb:cc:dd:ee:01=laptop,aa:bb:cc:dd:ee:02"
//
// clientwatchd
// ```

mod log_sink;

use anyhow::{Context, Result};
use clientwatch_core::traits::EventSink;
use clientwatch_core::{
    ControllerConfig, ControllerPlatform, Poller, TransitionEngine, WatchConfig,
    WatchEntryConfig,
};
use clientwatch_unifi::UnifiSource;
use clientwatch_webhook::WebhookSink;
use std::env;
use std::future::Future;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use crate::log_sink::LogSink;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (including a failed seeding poll)
#[derive(Debug, Clone, Copy)]
enum ClientwatchExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<ClientwatchExitCode> for ExitCode {
    fn from(code: ClientwatchExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Timeout for a single webhook delivery
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Application configuration
struct Config {
    watch: WatchConfig,
    webhook_url: Option<String>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{} is required. Set it via: export {}=...", key, key))
        };

        let port = required("CLIENTWATCH_PORT")?;
        let port: u16 = port
            .trim()
            .parse()
            .with_context(|| format!("CLIENTWATCH_PORT must be a port number. Got: {}", port))?;

        let mut controller = ControllerConfig::new(
            required("CLIENTWATCH_HOSTNAME")?.trim(),
            port,
            required("CLIENTWATCH_USERNAME")?,
            required("CLIENTWATCH_PASSWORD")?,
        );

        if let Some(site) = lookup("CLIENTWATCH_SITE") {
            controller.site = site.trim().to_string();
        }
        if let Some(platform) = lookup("CLIENTWATCH_PLATFORM") {
            controller.platform = platform.parse::<ControllerPlatform>()?;
        }
        if let Some(verify) = lookup("CLIENTWATCH_VERIFY_TLS") {
            controller.verify_tls = parse_bool("CLIENTWATCH_VERIFY_TLS", &verify)?;
        }

        let mut watch = WatchConfig::new(controller);
        watch.clients_to_watch = parse_clients(&lookup("CLIENTWATCH_CLIENTS").unwrap_or_default());

        if let Some(interval) = lookup("CLIENTWATCH_POLL_INTERVAL") {
            watch.poll_interval_secs = interval.trim().parse().with_context(|| {
                format!(
                    "CLIENTWATCH_POLL_INTERVAL must be a number of seconds. Got: {}",
                    interval
                )
            })?;
        }

        Ok(Self {
            watch,
            webhook_url: lookup("CLIENTWATCH_WEBHOOK_URL").filter(|u| !u.trim().is_empty()),
            log_level: lookup("CLIENTWATCH_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.watch.validate()?;

        let interval = self.watch.poll_interval_secs;
        if !(1..=3600).contains(&interval) {
            anyhow::bail!(
                "CLIENTWATCH_POLL_INTERVAL must be between 1 and 3600 seconds. Got: {}",
                interval
            );
        }

        if let Some(ref url) = self.webhook_url
            && !url.starts_with("https://")
            && !url.starts_with("http://")
        {
            anyhow::bail!(
                "CLIENTWATCH_WEBHOOK_URL must use HTTP or HTTPS scheme. Got: {}",
                url
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "CLIENTWATCH_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }
}

/// Parse `mac[=alias],mac[=alias],...` preserving order
///
/// MAC syntax is checked later by `WatchConfig::validate`.
fn parse_clients(raw: &str) -> Vec<WatchEntryConfig> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|item| match item.split_once('=') {
            Some((mac, alias)) => WatchEntryConfig {
                mac: mac.trim().to_string(),
                alias: Some(alias.trim().to_string()),
            },
            None => WatchEntryConfig {
                mac: item.to_string(),
                alias: None,
            },
        })
        .collect()
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("{} must be true or false. Got: {}", key, value),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ClientwatchExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return ClientwatchExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr; stdout carries event lines
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ClientwatchExitCode::ConfigError.into();
    }

    info!("Starting clientwatchd");
    info!(
        "Configuration loaded: controller {}:{} (site {}), {} watched client(s), polling every {}s",
        config.watch.controller.hostname,
        config.watch.controller.port,
        config.watch.controller.site,
        config.watch.clients_to_watch.len(),
        config.watch.poll_interval_secs
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ClientwatchExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {:#}", e);
            ClientwatchExitCode::RuntimeError
        } else {
            ClientwatchExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let source = UnifiSource::new(config.watch.controller.clone())?;

    let sink: Box<dyn EventSink> = match config.webhook_url {
        Some(ref url) => {
            let webhook = WebhookSink::new(url, WEBHOOK_TIMEOUT)?;
            info!("Delivering events to webhook {}", webhook.url());
            Box::new(webhook)
        }
        None => {
            info!("Delivering events to stdout");
            Box::new(LogSink::stdout())
        }
    };

    let engine = TransitionEngine::from_config(Box::new(source), sink, &config.watch)?;

    if engine.watch_list().is_empty() {
        warn!("CLIENTWATCH_CLIENTS is empty; no events will be emitted");
    }
    for entry in engine.watch_list().iter() {
        info!(
            "Watching {} ({})",
            entry.mac,
            entry.alias.as_deref().unwrap_or("-")
        );
    }

    let shutdown = shutdown_signal()?;

    let poller = Poller::start(engine, config.watch.poll_interval())
        .await
        .context("Initial poll failed")?;

    info!("Ready to watch client transitions");
    poller
        .run_until(async {
            let signal = shutdown.await;
            info!("Received shutdown signal: {}", signal);
        })
        .await?;

    info!("Shutting down daemon");
    Ok(())
}

/// Install SIGTERM and SIGINT handlers
///
/// The returned future resolves with the name of the first signal received.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = &'static str>> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    })
}

/// Install a Ctrl-C handler
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = &'static str>> {
    Ok(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to wait for CTRL-C: {}", e);
            std::future::pending::<()>().await;
        }
        "SIGINT"
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("CLIENTWATCH_HOSTNAME", "unifi.local"),
        ("CLIENTWATCH_PORT", "8443"),
        ("CLIENTWATCH_USERNAME", "admin"),
        ("CLIENTWATCH_PASSWORD", "hunter2"),
    ];

    fn load(extra: &[(&str, &str)]) -> Result<Config> {
        let mut pairs: Vec<(&str, &str)> = REQUIRED.to_vec();
        pairs.extend_from_slice(extra);
        Config::from_lookup(lookup_from(&pairs))
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        config.validate().unwrap();

        assert_eq!(config.watch.controller.site, "default");
        assert_eq!(config.watch.controller.platform, ControllerPlatform::Classic);
        assert!(!config.watch.controller.verify_tls);
        assert_eq!(config.watch.poll_interval_secs, 30);
        assert!(config.watch.clients_to_watch.is_empty());
        assert!(config.webhook_url.is_none());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_missing_required_var() {
        let result = Config::from_lookup(lookup_from(&REQUIRED[..3]));
        let message = format!("{:#}", result.err().unwrap());
        assert!(message.contains("CLIENTWATCH_PASSWORD"));
    }

    #[test]
    fn test_bad_port() {
        assert!(load(&[("CLIENTWATCH_PORT", "http")]).is_err());
        assert!(load(&[("CLIENTWATCH_PORT", "70000")]).is_err());
    }

    #[test]
    fn test_optional_controller_settings() {
        let config = load(&[
            ("CLIENTWATCH_SITE", "branch"),
            ("CLIENTWATCH_PLATFORM", "unifi_os"),
            ("CLIENTWATCH_VERIFY_TLS", "true"),
        ])
        .unwrap();

        assert_eq!(config.watch.controller.site, "branch");
        assert_eq!(config.watch.controller.platform, ControllerPlatform::UnifiOs);
        assert!(config.watch.controller.verify_tls);

        assert!(load(&[("CLIENTWATCH_PLATFORM", "cloud")]).is_err());
        assert!(load(&[("CLIENTWATCH_VERIFY_TLS", "maybe")]).is_err());
    }

    #[test]
    fn test_parse_clients() {
        let entries = parse_clients(" AA:BB:CC:DD:EE:01 = laptop ,, aa:bb:cc:dd:ee:02 ");
        assert_eq!(
            entries,
            vec![
                WatchEntryConfig {
                    mac: "AA:BB:CC:DD:EE:01".into(),
                    alias: Some("laptop".into()),
                },
                WatchEntryConfig {
                    mac: "aa:bb:cc:dd:ee:02".into(),
                    alias: None,
                },
            ]
        );
        assert!(parse_clients("").is_empty());
    }

    #[test]
    fn test_clients_validated() {
        let config = load(&[("CLIENTWATCH_CLIENTS", "aa:bb:cc:dd:ee:01=laptop,nope")]).unwrap();
        assert!(config.validate().is_err());

        let config = load(&[(
            "CLIENTWATCH_CLIENTS",
            "aa:bb:cc:dd:ee:01=laptop,AA-BB-CC-DD-EE-01=again",
        )])
        .unwrap();
        assert!(config.validate().is_err(), "duplicate MAC rejected");
    }

    #[test]
    fn test_poll_interval_range() {
        assert!(load(&[("CLIENTWATCH_POLL_INTERVAL", "0")]).unwrap().validate().is_err());
        assert!(load(&[("CLIENTWATCH_POLL_INTERVAL", "3601")]).unwrap().validate().is_err());
        assert!(load(&[("CLIENTWATCH_POLL_INTERVAL", "soon")]).is_err());

        let config = load(&[("CLIENTWATCH_POLL_INTERVAL", "5")]).unwrap();
        config.validate().unwrap();
        assert_eq!(config.watch.poll_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_webhook_and_log_level() {
        let config = load(&[
            ("CLIENTWATCH_WEBHOOK_URL", "https://hooks.local/in"),
            ("CLIENTWATCH_LOG_LEVEL", "DEBUG"),
        ])
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.webhook_url.as_deref(), Some("https://hooks.local/in"));

        let config = load(&[("CLIENTWATCH_WEBHOOK_URL", "ftp://hooks.local")]).unwrap();
        assert!(config.validate().is_err());

        let config = load(&[("CLIENTWATCH_LOG_LEVEL", "loud")]).unwrap();
        assert!(config.validate().is_err());
    }
}
