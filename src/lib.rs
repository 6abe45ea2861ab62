//! Humidor firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod analytics;
pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod safety;
pub mod sensors;
pub mod store;
pub mod time;

// Hardware-facing modules compile on every target; the real peripheral
// access inside them is cfg-gated.
pub mod adapters;
pub mod drivers;
pub mod pins;
