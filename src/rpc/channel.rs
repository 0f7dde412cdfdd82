//! Command Channel: bounded pub/sub over a listener transport.
//!
//! ```text
//!             connect / disconnect
//!  transport ──────────────────────▶ ┌─────────────────────────┐
//!   sessions ◀── send_text ───────── │ listeners [H; 4]        │ ◀── broadcast
//!                                    │ consumers [Arc<dyn>; 4] │ ◀── receive
//!                                    └────────────┬────────────┘
//!                                                 └──▶ CommandConsumer::on_message
//! ```
//!
//! Both tables are fixed-size slot arrays behind one blocking mutex.  The
//! lock is held only to read or edit a table, never while sending or while
//! a consumer runs, so a consumer may broadcast a reply from inside
//! `on_message`.

use core::cell::RefCell;
use std::sync::Arc;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::{debug, info, warn};

use crate::app::ports::{BroadcastPort, CommandConsumer};
use crate::config::{MAX_CONSUMERS, MAX_LISTENERS};
use crate::error::ChannelError;

use super::transport::ListenerTransport;

struct Tables<H> {
    listeners: [Option<H>; MAX_LISTENERS],
    consumers: [Option<Arc<dyn CommandConsumer>>; MAX_CONSUMERS],
}

fn same_consumer(a: &Arc<dyn CommandConsumer>, b: &Arc<dyn CommandConsumer>) -> bool {
    core::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

pub struct CommandChannel<T: ListenerTransport> {
    transport: T,
    tables: Mutex<CriticalSectionRawMutex, RefCell<Tables<T::Handle>>>,
}

impl<T: ListenerTransport> CommandChannel<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            tables: Mutex::new(RefCell::new(Tables {
                listeners: [None; MAX_LISTENERS],
                consumers: Default::default(),
            })),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // ── Listener registry ────────────────────────────────────

    /// Admit a newly connected listener into the first free slot.
    ///
    /// A duplicate handle and a full table are refused alike; the caller is
    /// expected to close the session.
    pub fn connect(&self, handle: T::Handle) -> Result<usize, ChannelError> {
        let slot = self.tables.lock(|t| {
            let mut t = t.borrow_mut();
            if t.listeners.contains(&Some(handle)) {
                return None;
            }
            let idx = t.listeners.iter().position(Option::is_none)?;
            t.listeners[idx] = Some(handle);
            Some(idx)
        });

        match slot {
            Some(idx) => {
                info!("channel: listener {:?} connected (slot {})", handle, idx);
                Ok(idx)
            }
            None => {
                warn!("channel: listener {:?} refused", handle);
                Err(ChannelError::ListenerRejected)
            }
        }
    }

    /// Close and forget `handle`.  Returns `false` if it was not registered.
    pub fn disconnect(&self, handle: T::Handle) -> bool {
        let removed = self.tables.lock(|t| {
            let mut t = t.borrow_mut();
            match t.listeners.iter_mut().find(|s| **s == Some(handle)) {
                Some(slot) => {
                    *slot = None;
                    true
                }
                None => false,
            }
        });

        if removed {
            self.transport.close(handle);
            info!("channel: listener {:?} disconnected", handle);
        }
        removed
    }

    pub fn listener_count(&self) -> usize {
        self.tables
            .lock(|t| t.borrow().listeners.iter().flatten().count())
    }

    /// Send `payload` to every listener in slot order.
    ///
    /// A listener whose delivery fails is disconnected; the rest still get
    /// the message.  Returns the number of successful deliveries.
    pub fn deliver(&self, payload: &str) -> usize {
        let handles: heapless::Vec<T::Handle, MAX_LISTENERS> = self
            .tables
            .lock(|t| t.borrow().listeners.iter().flatten().copied().collect());

        debug!("channel: broadcast to {} -> {}", handles.len(), payload);

        let mut delivered = 0;
        for handle in handles {
            match self.transport.send_text(handle, payload) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!("channel: send to {:?} failed: {:?}", handle, e);
                    self.disconnect(handle);
                }
            }
        }
        delivered
    }

    // ── Consumer registry ────────────────────────────────────

    /// Add a consumer for inbound messages.  The same consumer (by identity)
    /// may only be registered once.
    pub fn register_consumer(&self, consumer: Arc<dyn CommandConsumer>) -> Result<(), ChannelError> {
        let accepted = self.tables.lock(|t| {
            let mut t = t.borrow_mut();
            if t.consumers.iter().flatten().any(|c| same_consumer(c, &consumer)) {
                return false;
            }
            match t.consumers.iter_mut().find(|s| s.is_none()) {
                Some(slot) => {
                    *slot = Some(consumer);
                    true
                }
                None => false,
            }
        });

        if accepted {
            Ok(())
        } else {
            warn!("channel: consumer refused (duplicate or table full)");
            Err(ChannelError::ConsumerRejected)
        }
    }

    /// Remove a consumer by identity.  Returns `false` if it was not registered.
    pub fn unregister_consumer(&self, consumer: &Arc<dyn CommandConsumer>) -> bool {
        self.tables.lock(|t| {
            let mut t = t.borrow_mut();
            for slot in &mut t.consumers {
                if slot.as_ref().is_some_and(|c| same_consumer(c, consumer)) {
                    *slot = None;
                    return true;
                }
            }
            false
        })
    }

    pub fn consumer_count(&self) -> usize {
        self.tables
            .lock(|t| t.borrow().consumers.iter().flatten().count())
    }

    /// Hand one inbound payload to every consumer in slot order.
    ///
    /// A consumer error is logged and does not stop the others.  Returns
    /// the number of consumers invoked.
    pub fn receive(&self, payload: &str) -> usize {
        let consumers: heapless::Vec<Arc<dyn CommandConsumer>, MAX_CONSUMERS> = self
            .tables
            .lock(|t| t.borrow().consumers.iter().flatten().cloned().collect());

        for consumer in &consumers {
            if let Err(e) = consumer.on_message(payload, self) {
                warn!("channel: consumer rejected message: {}", e);
            }
        }
        consumers.len()
    }
}

impl<T: ListenerTransport> BroadcastPort for CommandChannel<T> {
    fn broadcast(&self, payload: &str) {
        self.deliver(payload);
    }
}
