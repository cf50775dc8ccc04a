//! LTE bridge firmware library.
//!
//! Drives a BG770-class LTE-M modem over AT commands: brings the module up
//! to an MQTT subscription, hands received payloads to the application and
//! recovers from every failure with a hardware reset.
//!
//! All ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module, so the link logic is tested on the host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod link;
pub mod modem;
pub mod pins;
