use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, Stream};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task;
use tokio::time::timeout;

use super::event::OutputEvent;
use super::sink::{ChannelSink, EventSink, StdOutSink};

/// Receives events from producers and broadcasts them to every sink.
///
/// Producers hold cheap `flume` senders (see [`EventBus::sender`]); a
/// background listener task fans events out to the configured sinks.
/// Subscribers get an [`EventStream`] backed by a dedicated channel sink.
pub struct EventBus {
    sinks: Arc<Mutex<Vec<Box<dyn EventSink>>>>,
    event_channel: (flume::Sender<OutputEvent>, flume::Receiver<OutputEvent>),
    listener: Arc<Mutex<Option<ListenerState>>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_sink(StdOutSink::default())
    }
}

impl EventBus {
    /// Create an EventBus with a single sink.
    pub fn with_sink<T>(sink: T) -> Self
    where
        T: EventSink + 'static,
    {
        Self::with_sinks(vec![Box::new(sink)])
    }

    /// Create an EventBus with multiple sinks.
    pub fn with_sinks(sinks: Vec<Box<dyn EventSink>>) -> Self {
        Self {
            sinks: Arc::new(Mutex::new(sinks)),
            event_channel: flume::unbounded(),
            listener: Arc::new(Mutex::new(None)),
        }
    }

    /// Create an EventBus with no sinks at all (streaming-only runs).
    pub fn without_sinks() -> Self {
        Self::with_sinks(Vec::new())
    }

    /// Dynamically add a sink (useful for per-request streaming).
    pub fn add_sink<T: EventSink + 'static>(&self, sink: T) {
        self.sinks.lock().push(Box::new(sink));
    }

    /// Add an already-boxed sink.
    pub fn add_boxed_sink(&self, sink: Box<dyn EventSink>) {
        self.sinks.lock().push(sink);
    }

    /// Get a clone of the sender side so producers can emit events.
    pub fn sender(&self) -> flume::Sender<OutputEvent> {
        self.event_channel.0.clone()
    }

    /// Subscribe to the bus: events arriving after this call are forwarded
    /// to the returned stream in emission order.
    pub fn subscribe(&self) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        self.add_sink(ChannelSink::new(tx));
        EventStream { rx }
    }

    /// Spawn a background task that listens for events and broadcasts to all
    /// sinks. Idempotent: calling multiple times has no effect.
    pub fn listen_for_events(&self) {
        let mut guard = self.listener.lock();
        if guard.is_some() {
            return; // Already listening
        }

        let receiver = self.event_channel.1.clone();
        let sinks = self.sinks.clone();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let handle = task::spawn(async move {
            let broadcast = |event: OutputEvent| {
                let mut sinks_guard = sinks.lock();
                for sink in sinks_guard.iter_mut() {
                    if let Err(e) = sink.handle(&event) {
                        tracing::debug!(error = %e, "event sink error");
                    }
                }
            };
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        // Drain already-queued events before shutting down so
                        // subscribers never miss the terminal event.
                        while let Ok(event) = receiver.try_recv() {
                            broadcast(event);
                        }
                        break;
                    }
                    recv = receiver.recv_async() => match recv {
                        Err(_) => break,
                        Ok(event) => broadcast(event),
                    }
                }
            }
        });

        *guard = Some(ListenerState {
            shutdown_tx,
            handle,
        });
    }

    /// Stop the background listener task, draining queued events first.
    pub async fn stop_listener(&self) {
        let state = { self.listener.lock().take() };
        if let Some(state) = state {
            let _ = state.shutdown_tx.send(());
            let _ = state.handle.await;
        }
    }

    /// Finalize the bus: stop the listener and drop all sinks, which closes
    /// every subscribed [`EventStream`].
    pub async fn finish(&self) {
        self.stop_listener().await;
        self.sinks.lock().clear();
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        if let Some(state) = self.listener.lock().take() {
            let _ = state.shutdown_tx.send(());
            state.handle.abort();
        }
    }
}

struct ListenerState {
    shutdown_tx: oneshot::Sender<()>,
    handle: task::JoinHandle<()>,
}

/// A subscription to a bus: yields events in emission order and ends when
/// the bus is finalized.
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<OutputEvent>,
}

impl EventStream {
    /// Await the next event; `None` once the bus has been finalized.
    pub async fn recv(&mut self) -> Option<OutputEvent> {
        self.rx.recv().await
    }

    /// Non-blocking receive.
    pub fn try_recv(&mut self) -> Option<OutputEvent> {
        self.rx.try_recv().ok()
    }

    /// Await the next event with a timeout.
    pub async fn next_timeout(&mut self, duration: Duration) -> Option<OutputEvent> {
        match timeout(duration, self.recv()).await {
            Ok(event) => event,
            Err(_) => None,
        }
    }

    /// Convert into a `futures` Stream.
    pub fn into_async_stream(self) -> impl Stream<Item = OutputEvent> {
        stream::unfold(self, |mut events| async move {
            events.recv().await.map(|event| (event, events))
        })
    }

    /// Collect every remaining event until the stream closes.
    pub async fn collect_all(mut self) -> Vec<OutputEvent> {
        let mut collected = Vec::new();
        while let Some(event) = self.recv().await {
            collected.push(event);
        }
        collected
    }
}
