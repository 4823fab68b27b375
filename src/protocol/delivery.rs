//! Send-and-confirm delivery of a single packet.
//!
//! ```text
//!   send ──fail──▶ elapsed >= deadline? ──yes──▶ SendTimeout
//!     │                 │ no
//!     │                 └──▶ back off, send again
//!     ok
//!     ▼
//!   ack queued? ──no──▶ wait ack_settle once
//!     ▼
//!   while ack queued: read ─ equal ──▶ Matched
//!                         └ differs ─▶ wait ack_poll, recheck
//! ```
//!
//! The transport's own hardware ack is authoritative.  The echoed ack
//! payload is corroboration only: with the nRF24 the payload rides on the
//! ack of the *next* packet, so the echo read back after a send is usually
//! the previous packet's value.  Under [`AckPolicy::Corroborate`] a
//! mismatch or a missing echo is recorded in [`AckStatus`] and the
//! delivery still succeeds.
//!
//! Retransmissions of the same value are harmless: the receiver treats
//! every packet as an idempotent assignment.

use embedded_hal::delay::DelayNs;
use log::{debug, warn};

use super::packet::{PACKET_SIZE, Packet};
use crate::app::ports::{Clock, RadioLink};
use crate::config::{AckPolicy, LinkConfig};
use crate::error::LinkError;

/// Bounded retry policy for one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Give up on transport retries once this much time has passed (ms).
    pub deadline_ms: u32,
    /// Pause between transport attempts (ms).
    pub backoff_ms: u32,
    /// One-off wait for the ack payload after a confirmed send (ms).
    pub ack_settle_ms: u32,
    /// Wait after a non-matching ack payload before rechecking (ms).
    pub ack_poll_ms: u32,
    pub ack: AckPolicy,
}

impl From<&LinkConfig> for RetryPolicy {
    fn from(c: &LinkConfig) -> Self {
        Self {
            deadline_ms: c.send_timeout_ms,
            backoff_ms: c.send_backoff_ms,
            ack_settle_ms: c.ack_settle_ms,
            ack_poll_ms: c.ack_poll_ms,
            ack: c.ack_policy,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&LinkConfig::default())
    }
}

/// What the ack payload said about a confirmed send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckStatus {
    /// The peer echoed exactly the sent value.
    Matched,
    /// No ack payload arrived.
    Missing,
    /// The last ack payload read carried this other value.
    Mismatched(u32),
}

/// A transport-confirmed delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Transport send attempts, including the successful one.
    pub attempts: u32,
    pub ack: AckStatus,
}

impl Delivery {
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

/// Deliver `packet`, blocking for up to roughly `deadline_ms` plus the ack
/// polling budget.
pub fn deliver<R, T>(
    radio: &mut R,
    time: &mut T,
    policy: &RetryPolicy,
    packet: Packet,
) -> Result<Delivery, LinkError>
where
    R: RadioLink,
    T: Clock + DelayNs,
{
    let start = time.uptime_ms();
    let value = packet.raw();
    let payload = packet.to_bytes();
    let mut attempts: u32 = 0;

    // 1. Transport confirmation, bounded by the deadline.
    loop {
        attempts += 1;
        let sent = match radio.send(&payload) {
            Ok(acked) => acked,
            Err(e) => {
                warn!("Radio send error: {:?}", e);
                false
            }
        };
        if sent {
            break;
        }
        let elapsed_ms = time.uptime_ms().saturating_sub(start);
        if elapsed_ms >= policy.deadline_ms as u64 {
            warn!(
                "Packet {} not confirmed after {} attempts ({} ms)",
                value, attempts, elapsed_ms
            );
            return Err(LinkError::SendTimeout {
                attempts,
                elapsed_ms,
            });
        }
        time.delay_ms(policy.backoff_ms);
    }

    // 2. Ack payload corroboration.
    if !ack_queued(radio) {
        time.delay_ms(policy.ack_settle_ms);
    }
    let mut ack = AckStatus::Missing;
    while ack_queued(radio) {
        let mut buf = [0u8; PACKET_SIZE];
        let n = match radio.read(&mut buf) {
            Ok(n) => n.min(PACKET_SIZE),
            Err(e) => {
                warn!("Radio ack read error: {:?}", e);
                break;
            }
        };
        let echoed = Packet::from_bytes(&buf[..n]).raw();
        if echoed == value {
            ack = AckStatus::Matched;
            break;
        }
        warn!("Ack payload {} does not match sent {}", echoed, value);
        ack = AckStatus::Mismatched(echoed);
        time.delay_ms(policy.ack_poll_ms);
    }

    debug!("Packet {} delivered ({} attempts, ack {:?})", value, attempts, ack);

    match (policy.ack, ack) {
        (AckPolicy::Require, AckStatus::Missing) => Err(LinkError::NoAck),
        (AckPolicy::Require, AckStatus::Mismatched(received)) => Err(LinkError::AckMismatch {
            expected: value,
            received,
        }),
        _ => Ok(Delivery { attempts, ack }),
    }
}

fn ack_queued<R: RadioLink>(radio: &mut R) -> bool {
    radio.is_ack_payload_available().unwrap_or_else(|e| {
        warn!("Radio FIFO status error: {:?}", e);
        false
    })
}
