//! GPIO / peripheral pin assignments for the PairLink node board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  The same board is used at both ends of the
//! pair; only the role strap differs.

// ---------------------------------------------------------------------------
// Role strap
// ---------------------------------------------------------------------------

/// Digital input with internal pull-up, sampled once at boot.
/// Open = Initiator (transmitter), tied to GND = Responder (receiver).
pub const ROLE_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Functional pin
// ---------------------------------------------------------------------------

/// Initiator: switch input with internal pull-up.
/// Responder: relay driver output (HIGH = relay energised).
pub const FUNCTIONAL_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// nRF24L01+ transceiver (SPI2 / FSPI)
// ---------------------------------------------------------------------------

/// Chip-enable: HIGH enables RX listening / pulses a TX.
pub const RADIO_CE_GPIO: i32 = 9;
/// SPI chip-select (active LOW), driven by the SPI master.
pub const RADIO_CSN_GPIO: i32 = 10;
pub const RADIO_MOSI_GPIO: i32 = 11;
pub const RADIO_SCLK_GPIO: i32 = 12;
pub const RADIO_MISO_GPIO: i32 = 13;

/// SPI clock for the transceiver (datasheet maximum is 10 MHz).
pub const RADIO_SPI_HZ: u32 = 8_000_000;
