//! Transport over a single tokio-tungstenite client connection

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::debug;
use url::Url;

use amb_core::{BusError, FrameListener, ReadyState, Result, Transport};

use crate::connection;

/// Frames queued for the writer task
#[derive(Debug)]
pub(crate) enum Outbound {
    Text(String),
    Close,
}

/// State shared between the handle and the connection task
pub(crate) struct Shared {
    pub(crate) url: Url,
    state: watch::Sender<ReadyState>,
    listener: RwLock<Option<FrameListener>>,
}

impl Shared {
    pub(crate) fn set_state(&self, state: ReadyState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!("[{}] {} -> {}", self.url, previous, state);
        }
    }

    pub(crate) fn state(&self) -> ReadyState {
        *self.state.borrow()
    }

    /// Hand one inbound text frame to the current listener
    pub(crate) fn deliver(&self, text: &str) {
        let listener = self
            .listener
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match listener {
            Some(listener) => listener(text),
            None => debug!("[{}] No listener installed, dropping frame", self.url),
        }
    }
}

/// Handle to one WebSocket client connection
///
/// Clones share the same connection. The connection task stops once every
/// handle is dropped or `close` is called. A bus built on this transport
/// holds one handle, so handlers must reply through a `WeakBus` or the
/// connection outlives the bus.
#[derive(Clone)]
pub struct WsTransport {
    shared: Arc<Shared>,
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl WsTransport {
    /// Start connecting to `url` and return immediately
    ///
    /// No retry: if the handshake fails the transport ends up `Closed`.
    ///
    /// # Panics
    /// Must be called from within a tokio runtime.
    pub fn connect(url: Url) -> Self {
        let (outbound, rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(ReadyState::Connecting);
        let shared = Arc::new(Shared {
            url,
            state,
            listener: RwLock::new(None),
        });

        tokio::spawn(connection::run(shared.clone(), rx));

        Self { shared, outbound }
    }

    pub fn url(&self) -> &Url {
        &self.shared.url
    }

    /// Wait until the socket is open
    ///
    /// # Errors
    /// `BusError::Transport` if the connection closes first or `timeout`
    /// elapses.
    pub async fn wait_open(&self, timeout: Duration) -> Result<()> {
        let mut rx = self.shared.state.subscribe();
        let wait = async {
            loop {
                let state = *rx.borrow_and_update();
                match state {
                    ReadyState::Open => return Ok(()),
                    ReadyState::Closing | ReadyState::Closed => {
                        return Err(BusError::Transport(format!(
                            "connection to {} closed before opening",
                            self.shared.url
                        )));
                    }
                    ReadyState::Connecting => {}
                }
                if rx.changed().await.is_err() {
                    return Err(BusError::Transport("connection state lost".to_string()));
                }
            }
        };

        tokio::time::timeout(timeout, wait).await.map_err(|_| {
            BusError::Transport(format!(
                "timed out after {:?} connecting to {}",
                timeout, self.shared.url
            ))
        })?
    }

    /// Flush queued frames, then send a close frame
    pub fn close(&self) {
        if self.outbound.send(Outbound::Close).is_err() {
            debug!("[{}] Connection task already finished", self.shared.url);
        }
    }

    /// Wait until the connection has fully closed
    pub async fn closed(&self) {
        let mut rx = self.shared.state.subscribe();
        while *rx.borrow_and_update() != ReadyState::Closed {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Transport for WsTransport {
    fn ready_state(&self) -> ReadyState {
        self.shared.state()
    }

    fn send_text(&self, text: String) -> Result<()> {
        let state = self.shared.state();
        if !state.is_open() {
            return Err(BusError::Transport(format!("socket is {}", state)));
        }
        self.outbound
            .send(Outbound::Text(text))
            .map_err(|e| BusError::Transport(format!("Failed to queue frame: {}", e)))
    }

    fn set_listener(&self, listener: FrameListener) {
        *self
            .shared
            .listener
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(listener);
    }
}
