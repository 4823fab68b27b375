//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements        | Connects to               |
//! |-------------|-------------------|---------------------------|
//! | `log_sink`  | EventSink         | Serial log output         |
//! | `time`      | Clock, DelayNs    | ESP32 system timer        |
//!
//! The radio adapter lives with the other peripheral drivers in
//! [`crate::drivers::nrf24`].

pub mod log_sink;
pub mod time;
