//! amb-ws: WebSocket transport for the amb-core message bus
//!
//! Opens one client connection with tokio-tungstenite and exposes it
//! through the `Transport` trait.

mod connection;
mod transport;

pub use transport::WsTransport;

use amb_core::{MessageBus, PageLocation, Result, SchemePolicy, endpoint_url};

/// Open the socket for `page` and wrap it in an unstarted bus
///
/// Returns immediately; the transport starts in `Connecting`. The returned
/// `WsTransport` handle shares the connection with the bus and can be used
/// to wait for the handshake or close the socket.
///
/// # Panics
/// Must be called from within a tokio runtime.
pub fn connect_bus(
    page: &PageLocation,
    policy: SchemePolicy,
) -> Result<(MessageBus, WsTransport)> {
    let url = endpoint_url(page, policy)?;
    let transport = WsTransport::connect(url);
    let bus = MessageBus::new(transport.clone());
    Ok((bus, transport))
}
