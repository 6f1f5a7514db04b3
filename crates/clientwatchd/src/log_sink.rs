// # Log Sink
//
// Default event sink when no webhook is configured: one JSON line per event
// on stdout (for piping into other tools) plus a human-readable `info!` log.

use async_trait::async_trait;
use clientwatch_core::Error;
use clientwatch_core::model::ClientChangeEvent;
use clientwatch_core::traits::EventSink;
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};
use tokio::sync::Mutex;
use tracing::info;

/// Same envelope the webhook sink sends
#[derive(Serialize)]
struct EventLine<'a> {
    trigger: &'static str,
    payload: &'a ClientChangeEvent,
}

/// Writes one JSON line per event
///
/// The writer is locked per line, so lines never interleave.
pub struct LogSink<W = Stdout> {
    out: Mutex<W>,
}

impl LogSink<Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W> LogSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

/// Render an event as a single JSON line (no trailing newline)
pub fn render(event: &ClientChangeEvent) -> Result<String, Error> {
    let line = serde_json::to_string(&EventLine {
        trigger: event.trigger(),
        payload: event,
    })?;
    Ok(line)
}

#[async_trait]
impl<W> EventSink for LogSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn dispatch(&self, event: &ClientChangeEvent) -> Result<(), Error> {
        let mut line = render(event)?;
        line.push('\n');

        info!(
            "{} ({}) is now {}",
            event.display_name(),
            event.mac,
            if event.online { "ONLINE" } else { "OFFLINE" }
        );

        let mut out = self.out.lock().await;
        out.write_all(line.as_bytes())
            .await
            .map_err(|e| Error::sink(format!("Failed to write event line: {}", e)))?;
        out.flush()
            .await
            .map_err(|e| Error::sink(format!("Failed to flush event line: {}", e)))
    }

    fn sink_name(&self) -> &'static str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clientwatch_core::{ClientSnapshot, MacAddress};
    use serde_json::Value;

    fn event(mac: &str, alias: Option<&str>, online: bool) -> ClientChangeEvent {
        let mac = MacAddress::parse(mac).unwrap();
        ClientChangeEvent::new(
            alias.map(str::to_owned),
            online,
            ClientSnapshot::new(mac, Some(7)),
        )
    }

    #[test]
    fn test_render_is_one_json_line() {
        let line = render(&event("aa:bb:cc:dd:ee:02", None, true)).unwrap();
        assert!(!line.contains('\n'));

        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["trigger"], "unifi.ClientChange");
        assert_eq!(value["payload"]["mac"], "aa:bb:cc:dd:ee:02");
        assert_eq!(value["payload"]["online"], true);
        assert_eq!(value["payload"]["alias"], Value::Null);
    }

    #[tokio::test]
    async fn test_dispatch_writes_one_line_per_event() {
        let sink = LogSink::new(Vec::new());

        sink.dispatch(&event("aa:bb:cc:dd:ee:01", Some("laptop"), false))
            .await
            .unwrap();
        sink.dispatch(&event("aa:bb:cc:dd:ee:02", None, true))
            .await
            .unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert!(output.ends_with('\n'));
        assert_eq!(lines[0]["payload"]["alias"], "laptop");
        assert_eq!(lines[0]["payload"]["online"], false);
        assert_eq!(lines[1]["payload"]["mac"], "aa:bb:cc:dd:ee:02");
    }

    #[tokio::test]
    async fn test_stdout_sink_dispatches() {
        let sink = LogSink::stdout();
        assert!(sink.dispatch(&event("aa:bb:cc:dd:ee:02", Some("phone"), false)).await.is_ok());
        assert_eq!(sink.sink_name(), "log");
    }
}
