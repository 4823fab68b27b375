//! Link configuration parameters
//!
//! All tunable timing and policy values for the paired radio link.
//! Both nodes must run with the same pipe addresses and channel.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::control::RelayState;

/// Nominal transceiver address width (bytes).
pub const ADDRESS_WIDTH: usize = 5;

/// Upper bound on a single delivery deadline (ms).
pub const MAX_SEND_TIMEOUT_MS: u32 = 60_000;

/// How the in-band ack-payload echo is weighed when confirming a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AckPolicy {
    /// Transport-level confirmation is authoritative; the echoed value only
    /// corroborates it and a mismatch is merely logged.
    Corroborate,
    /// The echoed value must match the sent packet for the delivery to succeed.
    Require,
}

/// Core link configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    // --- Delivery ---
    /// Deadline for obtaining a transport-level send confirmation (ms)
    pub send_timeout_ms: u32,
    /// Pause between transport send attempts (ms)
    pub send_backoff_ms: u32,
    /// One-off wait for an ack payload after a confirmed send (ms)
    pub ack_settle_ms: u32,
    /// Wait between ack payload reads that did not match (ms)
    pub ack_poll_ms: u32,
    /// Ack payload handling
    pub ack_policy: AckPolicy,

    // --- Link health ---
    /// Consecutive delivery failures before the Initiator declares the link down
    pub max_lost: u8,
    /// Silence on the Responder before the link is declared down (ms)
    pub link_timeout_ms: u32,
    /// Initiator boots with an empty failure count instead of a full one
    pub initiator_start_linked: bool,
    /// Responder treats boot as a receipt instead of waiting for traffic
    pub responder_start_linked: bool,

    // --- Output ---
    /// Relay position applied whenever link health cannot be confirmed
    pub safe_state: RelayState,

    // --- Timing ---
    /// Settle delay before sampling the role pin (ms)
    pub role_settle_ms: u32,
    /// Idle time between main-loop ticks (ms)
    pub tick_interval_ms: u32,

    // --- Radio ---
    /// RF channel (0-125, 2400 MHz + n)
    pub rf_channel: u8,
    /// Address the Initiator transmits on and the Responder listens on
    pub forward_address: [u8; ADDRESS_WIDTH],
    /// Address the Responder transmits on and the Initiator listens on
    pub backward_address: [u8; ADDRESS_WIDTH],
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            // Delivery
            send_timeout_ms: 5000,
            send_backoff_ms: 500,
            ack_settle_ms: 100,
            ack_poll_ms: 50,
            ack_policy: AckPolicy::Corroborate,

            // Link health
            max_lost: 5,
            link_timeout_ms: 10_000,
            initiator_start_linked: true,
            responder_start_linked: false,

            // Relay off when in doubt
            safe_state: RelayState::Off,

            // Timing
            role_settle_ms: 20,
            tick_interval_ms: 50,

            // Radio
            rf_channel: 76,
            forward_address: *b"Forwd",
            backward_address: *b"Backw",
        }
    }
}

impl LinkConfig {
    /// Range-check every field. Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.send_timeout_ms == 0 || self.send_timeout_ms > MAX_SEND_TIMEOUT_MS {
            return Err(ConfigError::ValidationFailed(
                "send_timeout_ms must be in 1..=60000",
            ));
        }
        if self.send_backoff_ms == 0 || self.send_backoff_ms >= self.send_timeout_ms {
            return Err(ConfigError::ValidationFailed(
                "send_backoff_ms must be in 1..send_timeout_ms",
            ));
        }
        if self.ack_poll_ms == 0 {
            return Err(ConfigError::ValidationFailed("ack_poll_ms must be > 0"));
        }
        if self.max_lost == 0 {
            return Err(ConfigError::ValidationFailed("max_lost must be > 0"));
        }
        if self.link_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("link_timeout_ms must be > 0"));
        }
        if self.rf_channel > 125 {
            return Err(ConfigError::ValidationFailed("rf_channel must be <= 125"));
        }
        if self.forward_address == self.backward_address {
            return Err(ConfigError::ValidationFailed(
                "forward and backward addresses must differ",
            ));
        }
        Ok(())
    }

    /// Longest a single tick can block inside deliveries: a sync packet and a
    /// control packet, each running to its deadline plus the final backoff.
    pub fn worst_case_tick_ms(&self) -> u32 {
        self.send_timeout_ms
            .saturating_add(self.send_backoff_ms)
            .saturating_add(self.ack_settle_ms)
            .saturating_mul(2)
    }
}
