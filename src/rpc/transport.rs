//! Listener transport abstraction: any session-oriented text channel.
//!
//! Concrete implementations:
//! - ESP-IDF HTTP server websocket sessions (`adapters::ws_server`)
//! - [`NullTransport`] for builds and tests with no network
//!
//! The [`CommandChannel`](super::channel::CommandChannel) is generic over
//! `ListenerTransport`, so a new transport needs zero changes to the
//! registry or dispatch logic.

/// Per-listener text delivery.
pub trait ListenerTransport: Send + Sync {
    /// Opaque connection identifier, e.g. a socket descriptor.
    type Handle: Copy + Eq + core::fmt::Debug + Send;

    /// Error type for a failed delivery.
    type Error: core::fmt::Debug;

    /// Send one complete text message to `handle`.
    fn send_text(&self, handle: Self::Handle, payload: &str) -> Result<(), Self::Error>;

    /// Tear down the session behind `handle`.  Must tolerate a handle that
    /// is already closed.
    fn close(&self, handle: Self::Handle);
}

/// A null transport that accepts every message and sends nothing.
/// Useful when the network is not up, and in tests.
pub struct NullTransport;

impl ListenerTransport for NullTransport {
    type Handle = u32;
    type Error = ();

    fn send_text(&self, _handle: u32, _payload: &str) -> Result<(), ()> {
        Ok(())
    }

    fn close(&self, _handle: u32) {}
}
