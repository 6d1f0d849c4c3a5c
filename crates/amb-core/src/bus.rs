//! Message bus
//!
//! Sends named JSON messages through a `Transport` and routes tagged inbound
//! frames to the handler registered for their name.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::envelope::Envelope;
use crate::error::{BusError, Result};
use crate::handler::{Handler, HandlerTable};
use crate::transport::{FrameListener, Transport};

/// Callback receiving inbound-path failures
pub type ErrorHook = Arc<dyn Fn(&BusError) + Send + Sync>;

/// Whether the inbound listener has been installed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusState {
    Unstarted,
    Started,
}

/// Outcome of routing one inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// The handler for `name` ran
    Delivered { name: String },
    /// Frame did not carry the bus marker
    Foreign,
    /// Valid envelope, but nothing is registered for `name`
    Unrouted { name: String },
}

/// Named-message bus over one transport
///
/// Cloning is cheap; clones share the transport and the handler table.
/// Handlers that need to reply should capture a [`WeakBus`] from
/// [`MessageBus::downgrade`]: a strong clone stored in the handler table
/// keeps the bus (and its transport) alive forever.
#[derive(Clone)]
pub struct MessageBus {
    inner: Arc<BusInner>,
}

/// Non-owning handle to a bus, for use inside handlers
#[derive(Clone)]
pub struct WeakBus {
    inner: Weak<BusInner>,
}

impl WeakBus {
    /// Get the bus back if any strong handle is still alive
    pub fn upgrade(&self) -> Option<MessageBus> {
        self.inner.upgrade().map(|inner| MessageBus { inner })
    }
}

struct BusInner {
    transport: Arc<dyn Transport>,
    handlers: RwLock<HandlerTable>,
    error_hook: RwLock<Option<ErrorHook>>,
    started: AtomicBool,
}

impl MessageBus {
    /// Create a bus that owns `transport`
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        Self::with_transport(Arc::new(transport))
    }

    /// Create a bus over a shared transport
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(BusInner {
                transport,
                handlers: RwLock::new(HandlerTable::new()),
                error_hook: RwLock::new(None),
                started: AtomicBool::new(false),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakBus {
        WeakBus {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn transport(&self) -> &dyn Transport {
        self.inner.transport.as_ref()
    }

    pub fn state(&self) -> BusState {
        if self.inner.started.load(Ordering::SeqCst) {
            BusState::Started
        } else {
            BusState::Unstarted
        }
    }

    /// Send a named message
    ///
    /// If the transport is not open the frame is dropped and `Ok(())` is
    /// returned; nothing is queued.
    ///
    /// # Errors
    /// Returns `BusError::Serialization` if `message` has no JSON form.
    pub fn send<T: Serialize + ?Sized>(&self, name: &str, message: &T) -> Result<()> {
        let frame = Envelope::wrap(name, message)?.to_frame()?;

        let state = self.inner.transport.ready_state();
        if !state.is_open() {
            debug!("Socket is {}, dropping outbound '{}'", state, name);
            return Ok(());
        }

        if let Err(e) = self.inner.transport.send_text(frame) {
            debug!("Failed to send '{}': {}", name, e);
        }
        Ok(())
    }

    /// Register the handler for `name`
    ///
    /// Returns `true` if an earlier handler for `name` was replaced.
    pub fn receive<H>(&self, name: impl Into<String>, handler: H) -> bool
    where
        H: Handler + 'static,
    {
        let name = name.into();
        let replaced = self.write_handlers().register(name.clone(), Arc::new(handler));
        if replaced {
            debug!("Replaced handler for '{}'", name);
        }
        replaced
    }

    /// Install the hook called for every malformed inbound frame
    pub fn on_error<F>(&self, hook: F)
    where
        F: Fn(&BusError) + Send + Sync + 'static,
    {
        *self
            .inner
            .error_hook
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(hook));
    }

    /// Install the inbound listener on the transport
    ///
    /// Calling this again replaces the previously installed listener.
    pub fn start(&self) {
        let bus = self.downgrade();
        let listener: FrameListener = Arc::new(move |text: &str| {
            if let Some(bus) = bus.upgrade() {
                bus.handle_frame(text);
            }
        });
        self.inner.transport.set_listener(listener);
        self.inner.started.store(true, Ordering::SeqCst);
    }

    /// Route one inbound frame
    ///
    /// The handler runs synchronously on the calling thread. The table lock
    /// is released before it runs.
    ///
    /// # Errors
    /// Returns `BusError::MalformedFrame` for non-JSON text or a tagged frame
    /// without a string `name`.
    pub fn dispatch(&self, text: &str) -> Result<Dispatch> {
        let Some(envelope) = Envelope::from_frame(text)? else {
            debug!("Ignoring untagged frame");
            return Ok(Dispatch::Foreign);
        };

        let Envelope { name, message, .. } = envelope;
        let handler = self.read_handlers().get(&name);
        match handler {
            Some(handler) => {
                handler.handle(message);
                Ok(Dispatch::Delivered { name })
            }
            None => {
                trace!("No handler for '{}'", name);
                Ok(Dispatch::Unrouted { name })
            }
        }
    }

    fn handle_frame(&self, text: &str) {
        if let Err(e) = self.dispatch(text) {
            warn!("Dropping inbound frame: {}", e);
            let hook = self
                .inner
                .error_hook
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            if let Some(hook) = hook {
                hook(&e);
            }
        }
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.read_handlers().contains(name)
    }

    pub fn handler_count(&self) -> usize {
        self.read_handlers().len()
    }

    /// Get all registered names
    pub fn handler_names(&self) -> Vec<String> {
        self.read_handlers()
            .names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn read_handlers(&self) -> RwLockReadGuard<'_, HandlerTable> {
        self.inner
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_handlers(&self) -> RwLockWriteGuard<'_, HandlerTable> {
        self.inner
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
