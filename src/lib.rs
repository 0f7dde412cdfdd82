//! PowerWheel firmware library.
//!
//! Exposes the pure-logic modules for integration testing and the binary.
//! All ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module, so the crate builds and tests on the host with
//! `--no-default-features`.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod pins;
pub mod rpc;
pub mod scheduler;

pub mod adapters;
pub mod drivers;
