//! Wire packet classification.
//!
//! Every packet is a single 32-bit word (little-endian).  The value space is
//! split into two disjoint classes:
//!
//! | Range        | Class     | Meaning                              |
//! |--------------|-----------|--------------------------------------|
//! | `0`, `1`     | Control   | relay off / on                       |
//! | `2..=255`    | Reserved  | never sent; acked but not decoded    |
//! | `>= 256`     | Sync      | keep-alive nonce (uptime timestamp)  |
//!
//! Sync nonces are derived from a free-running timestamp, so a timestamp that
//! lands below [`SYNC_FLOOR`] is bumped up to it.  That coercion is the only
//! thing keeping a keep-alive from being read as a relay command.

use crate::control::RelayState;

/// Payload width in bytes. Both ends must agree.
pub const PACKET_SIZE: usize = 4;

/// Smallest value in the Sync class.
pub const SYNC_FLOOR: u32 = 256;

/// A decoded wire packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packet {
    /// Remote input state to mirror on the relay.
    Control(RelayState),
    /// Keep-alive nonce, always `>= SYNC_FLOOR`.
    Sync(u32),
    /// A value inside the control range that carries no command.
    Reserved(u32),
}

impl Packet {
    /// Build a sync packet from a raw timestamp, lifting it out of the
    /// control range when needed.
    pub const fn sync(timestamp: u32) -> Self {
        if timestamp < SYNC_FLOOR {
            Self::Sync(SYNC_FLOOR)
        } else {
            Self::Sync(timestamp)
        }
    }

    pub const fn control(state: RelayState) -> Self {
        Self::Control(state)
    }

    /// Classify a raw word received from the air.
    pub const fn decode(raw: u32) -> Self {
        match raw {
            0 => Self::Control(RelayState::Off),
            1 => Self::Control(RelayState::On),
            2..SYNC_FLOOR => Self::Reserved(raw),
            _ => Self::Sync(raw),
        }
    }

    /// The raw word this packet travels as.
    pub const fn raw(self) -> u32 {
        match self {
            Self::Control(RelayState::Off) => 0,
            Self::Control(RelayState::On) => 1,
            Self::Sync(v) | Self::Reserved(v) => v,
        }
    }

    pub const fn is_control(self) -> bool {
        matches!(self, Self::Control(_))
    }

    pub fn to_bytes(self) -> [u8; PACKET_SIZE] {
        self.raw().to_le_bytes()
    }

    /// Decode a received buffer.  Short buffers are zero-extended, which is
    /// what the radio leaves in the unused tail of a narrower payload.
    pub fn from_bytes(buf: &[u8]) -> Self {
        let mut word = [0u8; PACKET_SIZE];
        let n = buf.len().min(PACKET_SIZE);
        word[..n].copy_from_slice(&buf[..n]);
        Self::decode(u32::from_le_bytes(word))
    }
}
