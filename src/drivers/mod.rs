//! Peripheral drivers and one-shot hardware initialisation.

pub mod gpio;
pub mod hw_init;
pub mod nrf24;
pub mod watchdog;
