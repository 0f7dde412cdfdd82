//! Real-time messaging layer.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   Command Channel                        │
//! │                                                          │
//! │  ┌───────────────────┐      ┌──────────────────────────┐ │
//! │  │ ListenerTransport │◀────▶│ CommandChannel           │ │
//! │  │ (trait)           │      │ listeners · consumers    │ │
//! │  └───────────────────┘      └──────┬─────────────▲─────┘ │
//! │                                    │             │ drain │
//! │                                    ▼      ┌──────┴─────┐ │
//! │              CommandConsumer (app layer)  │ Inbox      │ │
//! │                                           └────────────┘ │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod channel;
pub mod inbox;
pub mod transport;
