//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules for the Humidor controller:
//! per-tick orchestration of sampling, interlocks, hysteresis control,
//! hourly statistics and target learning.  All interaction with hardware
//! happens through **port traits** defined in [`ports`], keeping this layer
//! fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
