// # Channel Sink
//
// Hands events to an in-process consumer over a bounded channel.
//
// ## Load Behavior
//
// - The channel is bounded so a stalled consumer cannot grow memory
// - When full, the event is dropped and `dispatch` returns `Error::Sink`
// - When the consumer is gone, every dispatch returns `Error::Sink`

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;

use crate::error::Error;
use crate::model::ClientChangeEvent;
use crate::traits::EventSink;

/// Consumer side of a [`ChannelSink`]
pub type EventStream = ReceiverStream<ClientChangeEvent>;

/// Event sink backed by a bounded `tokio::sync::mpsc` channel
///
/// # Example
///
/// ```rust,no_run
/// use clientwatch_core::sink::ChannelSink;
/// use tokio_stream::StreamExt;
///
/// #[tokio::main]
/// async fn main() {
///     let (sink, mut events) = ChannelSink::new(100);
///
///     // hand `sink` to a TransitionEngine, then:
///     while let Some(event) = events.next().await {
///         println!("{} is now {}", event.display_name(), event.kind());
///     }
/// #   drop(sink);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<ClientChangeEvent>,
}

impl ChannelSink {
    /// Create a sink and the stream its events arrive on
    ///
    /// A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> (Self, EventStream) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, ReceiverStream::new(rx))
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn dispatch(&self, event: &ClientChangeEvent) -> Result<(), Error> {
        match self.tx.try_send(event.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(dropped)) => {
                warn!(
                    "Event channel full, dropping {} event for {}; consumer is falling behind",
                    dropped.kind(),
                    dropped.mac
                );
                Err(Error::sink("event channel full"))
            }
            Err(TrySendError::Closed(_)) => Err(Error::sink("event channel closed")),
        }
    }

    fn sink_name(&self) -> &'static str {
        "channel"
    }
}
