//! amb-core: named-message bus over a single WebSocket-style transport
//!
//! Provides the envelope format, the handler table, the `MessageBus`
//! itself and the `Transport` seam it talks through.

pub mod bus;
pub mod config;
pub mod cookie;
pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod handler;
pub mod transport;

pub use bus::{BusState, Dispatch, ErrorHook, MessageBus, WeakBus};
pub use config::{ClientConfig, Config, ConnectionConfig};
pub use cookie::parse_cookie;
pub use endpoint::{PageLocation, SchemePolicy, endpoint_url};
pub use envelope::Envelope;
pub use error::{BusError, Result};
pub use handler::{Handler, HandlerTable};
pub use transport::{FrameListener, MemoryTransport, ReadyState, Transport};
