//! Websocket endpoint on the ESP-IDF HTTP server.
//!
//! ```text
//!  browser ──ws──▶ httpd task ──▶ ws_handler
//!                                   ├─ new session   → attach sender, CommandChannel::connect
//!                                   ├─ text frame    → Inbox::push
//!                                   └─ closed        → forget sender, CommandChannel::disconnect
//!  commands activity ──▶ Inbox::drain ──▶ CommandChannel::receive ──▶ replies
//!  telemetry/replies ──▶ CommandChannel::broadcast ──▶ WsTransport::send_text (detached sender)
//! ```
//!
//! Sessions are identified by their socket descriptor.  A detached send
//! waits for the httpd task to run it, so nothing on the httpd task may
//! send: inbound text is queued and dispatched elsewhere, and sessions are
//! dropped by forgetting their sender before the listener is removed.
//! A refused or oversized session is closed by failing the handler.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use esp_idf_svc::http::server::ws::{EspHttpWsConnection, EspHttpWsDetachedSender};
use esp_idf_svc::http::server::{Configuration, EspHttpServer};
use esp_idf_svc::sys::{ESP_FAIL, EspError};
use esp_idf_svc::ws::FrameType;
use log::{debug, info, warn};

use crate::config::MAX_LISTENERS;
use crate::rpc::channel::CommandChannel;
use crate::rpc::inbox::{Inbox, MAX_FRAME_LEN};
use crate::rpc::transport::ListenerTransport;

#[derive(Debug)]
pub enum WsSendError {
    UnknownSession,
    Esp(EspError),
}

type SharedSender = Arc<Mutex<EspHttpWsDetachedSender>>;

/// Listener transport backed by detached websocket senders.
///
/// The map lock is only held to look a sender up, never across a send,
/// so the httpd task can always attach and forget sessions.
#[derive(Default)]
pub struct WsTransport {
    senders: Mutex<HashMap<i32, SharedSender>>,
}

impl WsTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn attach(&self, session: i32, sender: EspHttpWsDetachedSender) {
        if let Ok(mut senders) = self.senders.lock() {
            senders.insert(session, Arc::new(Mutex::new(sender)));
        }
    }

    /// Drop the sender for `session` without sending anything.
    fn forget(&self, session: i32) -> Option<SharedSender> {
        self.senders.lock().ok()?.remove(&session)
    }

    fn sender(&self, session: i32) -> Option<SharedSender> {
        self.senders.lock().ok()?.get(&session).cloned()
    }
}

impl ListenerTransport for WsTransport {
    type Handle = i32;
    type Error = WsSendError;

    fn send_text(&self, handle: i32, payload: &str) -> Result<(), WsSendError> {
        let sender = self.sender(handle).ok_or(WsSendError::UnknownSession)?;
        let mut sender = sender.lock().map_err(|_| WsSendError::UnknownSession)?;
        if sender.is_closed() {
            return Err(WsSendError::UnknownSession);
        }
        sender
            .send(FrameType::Text(false), payload.as_bytes())
            .map_err(WsSendError::Esp)
    }

    fn close(&self, handle: i32) {
        let Some(sender) = self.forget(handle) else {
            return;
        };
        if let Ok(mut sender) = sender.lock() {
            if !sender.is_closed() {
                let _ = sender.send(FrameType::Close, &[]);
            }
        }
    }
}

/// Remove `session` everywhere.  The sender goes first so the channel's
/// close finds nothing to send on.
fn drop_session(channel: &CommandChannel<WsTransport>, session: i32) {
    channel.transport().forget(session);
    channel.disconnect(session);
}

/// Handler failure makes httpd close the socket.
fn close_session() -> EspError {
    EspError::from_infallible::<ESP_FAIL>()
}

/// Start the HTTP server and register the websocket endpoint at `path`.
///
/// Inbound text frames land in `inbox`; the caller drains it from another
/// task.  The returned server must be kept alive for the endpoint to keep
/// working.
pub fn start(
    channel: Arc<CommandChannel<WsTransport>>,
    inbox: Arc<Inbox<i32>>,
    path: &str,
) -> anyhow::Result<EspHttpServer<'static>> {
    let server_config = Configuration {
        max_uri_handlers: 2,
        // listeners plus one for a refused handshake in flight
        max_open_sockets: MAX_LISTENERS + 1,
        stack_size: 8192,
        ..Default::default()
    };
    let mut server = EspHttpServer::new(&server_config)?;

    server.ws_handler(path, move |ws: &mut EspHttpWsConnection| -> Result<(), EspError> {
        let session = ws.session();

        if ws.is_new() {
            channel.transport().attach(session, ws.create_detached_sender()?);
            if channel.connect(session).is_err() {
                channel.transport().forget(session);
                return Err(close_session());
            }
            return Ok(());
        }

        if ws.is_closed() {
            drop_session(&channel, session);
            return Ok(());
        }

        let (frame_type, len) = ws.recv(&mut [])?;
        if len > MAX_FRAME_LEN {
            // payload left unread, the stream cannot be resynchronised
            warn!("ws {}: frame of {} bytes, closing session", session, len);
            drop_session(&channel, session);
            return Err(close_session());
        }

        let mut buf = [0u8; MAX_FRAME_LEN];
        ws.recv(&mut buf[..len])?;
        if !matches!(frame_type, FrameType::Text(false)) {
            debug!("ws {}: ignoring {:?} frame", session, frame_type);
            return Ok(());
        }

        let text = buf[..len].strip_suffix(&[0]).unwrap_or(&buf[..len]);
        match core::str::from_utf8(text) {
            Ok(payload) => {
                if let Err(e) = inbox.push(session, payload) {
                    warn!("ws {}: frame dropped: {}", session, e);
                }
            }
            Err(_) => warn!("ws {}: non-UTF-8 text frame dropped", session),
        }
        Ok(())
    })?;

    info!("ws_server: listening at {}", path);
    Ok(server)
}
