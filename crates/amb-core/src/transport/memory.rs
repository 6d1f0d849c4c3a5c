//! In-process transport
//!
//! Records outbound frames and lets the host push inbound frames by hand.
//! Useful for embedding the bus without a socket and for tests.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::{FrameListener, ReadyState, Transport};
use crate::error::{BusError, Result};

#[derive(Clone)]
pub struct MemoryTransport {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    state: ReadyState,
    sent: Vec<String>,
    listener: Option<FrameListener>,
}

impl MemoryTransport {
    /// Create an open transport with no listener
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: ReadyState::Open,
                sent: Vec::new(),
                listener: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Simulate a state change (e.g. a dropped connection)
    pub fn set_ready_state(&self, state: ReadyState) {
        self.lock().state = state;
    }

    /// Deliver an inbound frame to the current listener
    ///
    /// Returns `false` if no listener is installed and the frame was dropped.
    pub fn inject(&self, text: &str) -> bool {
        let listener = self.lock().listener.clone();
        match listener {
            Some(listener) => {
                listener(text);
                true
            }
            None => {
                debug!("No listener installed, dropping inbound frame");
                false
            }
        }
    }

    /// Frames written so far
    pub fn sent(&self) -> Vec<String> {
        self.lock().sent.clone()
    }

    /// Drain the recorded frames
    pub fn take_sent(&self) -> Vec<String> {
        std::mem::take(&mut self.lock().sent)
    }

    pub fn has_listener(&self) -> bool {
        self.lock().listener.is_some()
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MemoryTransport {
    fn ready_state(&self) -> ReadyState {
        self.lock().state
    }

    fn send_text(&self, text: String) -> Result<()> {
        let mut inner = self.lock();
        if !inner.state.is_open() {
            return Err(BusError::Transport(format!("socket is {}", inner.state)));
        }
        inner.sent.push(text);
        Ok(())
    }

    fn set_listener(&self, listener: FrameListener) {
        self.lock().listener = Some(listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_records_sent_frames() {
        let transport = MemoryTransport::new();
        transport.send_text("a".to_string()).unwrap();
        transport.send_text("b".to_string()).unwrap();
        assert_eq!(transport.sent(), vec!["a", "b"]);
        assert_eq!(transport.take_sent(), vec!["a", "b"]);
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_send_fails_when_not_open() {
        let transport = MemoryTransport::new();
        transport.set_ready_state(ReadyState::Closed);
        assert!(transport.send_text("x".to_string()).is_err());
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_listener_is_replaced() {
        let transport = MemoryTransport::new();
        assert!(!transport.inject("dropped"));

        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let f = first.clone();
        let s = second.clone();

        transport.set_listener(Arc::new(move |_: &str| {
            f.fetch_add(1, Ordering::SeqCst);
        }));
        transport.set_listener(Arc::new(move |_: &str| {
            s.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(transport.inject("frame"));
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }
}
