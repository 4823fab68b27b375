//! PairLink node firmware library.
//!
//! Exposes the link protocol, the two node cycles and the drivers for
//! integration testing.  All ESP-IDF-specific code is guarded by
//! `#[cfg(all(target_os = "espidf", feature = "espidf"))]` within each
//! module; anywhere else the drivers fall back to simulations.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod health;
pub mod node;
pub mod pins;
pub mod protocol;
pub mod role;
pub mod status;

pub mod adapters;
pub mod control;
pub mod drivers;
