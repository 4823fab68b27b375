//! Port traits — the hexagonal boundary between the link protocol and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ node cycle (domain)
//! ```
//!
//! The transceiver, the clock, and the status sink are consumed through the
//! traits below.  GPIO and blocking delays use the embedded-hal 1.0 traits
//! directly (`InputPin`, `OutputPin`, `DelayNs`), so any HAL pin or delay
//! plugs in without a wrapper.

use super::events::NodeEvent;

// ───────────────────────────────────────────────────────────────
// Radio link port (driven adapter: domain ↔ transceiver)
// ───────────────────────────────────────────────────────────────

/// Packet transceiver with hardware acknowledgement and ack payloads.
///
/// The transceiver owns modulation, addressing, CRC, and its own
/// auto-retransmit; the protocol above it only sees whole payloads.
pub trait RadioLink {
    /// Error type for bus-level failures (SPI, pins).
    type Error: core::fmt::Debug;

    /// Transmit one payload and block until the peer's hardware ack arrives
    /// or the transceiver gives up.  `Ok(false)` means no ack was received.
    fn send(&mut self, payload: &[u8]) -> Result<bool, Self::Error>;

    /// Pipe number of the oldest pending received payload, if any.
    fn available(&mut self) -> Result<Option<u8>, Self::Error>;

    /// Pop the oldest received payload into `buf`. Returns its length.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Queue a payload to ride on the next hardware ack sent on `pipe`.
    fn write_ack_payload(&mut self, pipe: u8, payload: &[u8]) -> Result<(), Self::Error>;

    /// Whether an ack payload from the peer is waiting to be read.
    fn is_ack_payload_available(&mut self) -> Result<bool, Self::Error>;

    fn start_listening(&mut self) -> Result<(), Self::Error>;

    fn stop_listening(&mut self) -> Result<(), Self::Error>;

    fn open_writing_pipe(&mut self, address: &[u8]) -> Result<(), Self::Error>;

    fn open_reading_pipe(&mut self, pipe: u8, address: &[u8]) -> Result<(), Self::Error>;
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: domain → monotonic timer)
// ───────────────────────────────────────────────────────────────

/// Monotonic time since boot.
pub trait Clock {
    /// Microseconds since boot.
    fn uptime_us(&self) -> u64;

    /// Milliseconds since boot.
    fn uptime_ms(&self) -> u64 {
        self.uptime_us() / 1000
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / display)
// ───────────────────────────────────────────────────────────────

/// The node cycles emit structured [`NodeEvent`]s through this port.
/// Adapters decide where they go (serial log, character display, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &NodeEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from configuration validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}
