//! Transport seam
//!
//! The bus only needs three things from a connection: its ready state,
//! a way to write one text frame, and a single slot for the inbound
//! frame listener.

mod memory;

use std::fmt;
use std::sync::Arc;

pub use memory::MemoryTransport;

use crate::Result;

/// Connection ready states (matching the browser WebSocket API)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReadyState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl ReadyState {
    pub fn is_open(self) -> bool {
        self == Self::Open
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Callback receiving each inbound text frame
pub type FrameListener = Arc<dyn Fn(&str) + Send + Sync>;

/// A persistent bidirectional text-frame connection
///
/// Implementations deliver inbound frames to the listener one at a time,
/// in arrival order.
pub trait Transport: Send + Sync {
    /// Current connection state
    fn ready_state(&self) -> ReadyState;

    /// Write one text frame
    ///
    /// # Errors
    /// Returns `BusError::Transport` if the connection cannot accept the
    /// frame (not open, or already torn down).
    fn send_text(&self, text: String) -> Result<()>;

    /// Install the inbound listener, replacing any previous one
    fn set_listener(&self, listener: FrameListener);
}
