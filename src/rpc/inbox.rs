//! Inbound frame queue between the websocket server and the dispatcher.
//!
//! The HTTP server task only copies text frames in; a separate periodic
//! activity drains them into [`CommandChannel::receive`].  Consumers reply
//! through detached senders that are serviced by the HTTP server task, so
//! a reply must never be produced on that task.
//!
//! ```text
//! ┌──────────────┐  push (try_send)  ┌───────────┐  drain  ┌────────────────┐
//! │ httpd task   │──────────────────▶│ Inbox [8] │────────▶│ CommandChannel │
//! │ (ws_handler) │                   └───────────┘         │ ::receive      │
//! └──────────────┘                  commands activity      └────────────────┘
//! ```

use core::fmt;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, warn};

use super::channel::CommandChannel;
use super::transport::ListenerTransport;

/// Largest inbound text frame accepted.
pub const MAX_FRAME_LEN: usize = 512;

/// Frames buffered between two drains.
pub const INBOX_DEPTH: usize = 8;

/// One queued text frame and the session it came from.
pub struct InboundFrame<H> {
    pub from: H,
    pub payload: heapless::String<MAX_FRAME_LEN>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboxError {
    /// No room until the dispatcher catches up.
    Full,
    /// Payload longer than [`MAX_FRAME_LEN`].
    TooLarge(usize),
}

impl fmt::Display for InboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "inbox full"),
            Self::TooLarge(len) => write!(f, "frame of {len} bytes exceeds {MAX_FRAME_LEN}"),
        }
    }
}

impl std::error::Error for InboxError {}

pub struct Inbox<H> {
    queue: Channel<CriticalSectionRawMutex, InboundFrame<H>, INBOX_DEPTH>,
}

impl<H: Copy + fmt::Debug + Send> Inbox<H> {
    pub const fn new() -> Self {
        Self {
            queue: Channel::new(),
        }
    }

    /// Queue one text frame.  Never blocks.
    pub fn push(&self, from: H, payload: &str) -> Result<(), InboxError> {
        let mut text = heapless::String::new();
        text.push_str(payload)
            .map_err(|_| InboxError::TooLarge(payload.len()))?;
        self.queue
            .try_send(InboundFrame { from, payload: text })
            .map_err(|_| InboxError::Full)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Hand queued frames to `channel` in arrival order, at most one
    /// queue's worth per call.  Returns the number dispatched.
    pub fn drain<T: ListenerTransport<Handle = H>>(&self, channel: &CommandChannel<T>) -> usize {
        let mut dispatched = 0;
        while dispatched < INBOX_DEPTH {
            let Ok(frame) = self.queue.try_receive() else {
                break;
            };
            debug!("inbox: frame from {:?}", frame.from);
            if channel.receive(&frame.payload) == 0 {
                warn!("inbox: no consumer for frame from {:?}", frame.from);
            }
            dispatched += 1;
        }
        dispatched
    }
}

impl<H: Copy + fmt::Debug + Send> Default for Inbox<H> {
    fn default() -> Self {
        Self::new()
    }
}
