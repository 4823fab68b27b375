//! Unified error types for the PairLink firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! main loop's error handling uniform. All variants are `Copy` so they can be
//! passed through events and the status report without allocation.
//!
//! None of these ever escape a tick: the link protocol recovers locally by
//! retrying on the next tick and reports through the status sink.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The link protocol failed to deliver or lost its peer.
    Link(LinkError),
    /// The radio transceiver rejected a command.
    Radio(&'static str),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Radio(msg) => write!(f, "radio: {msg}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Link protocol errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// No transport-level confirmation before the delivery deadline.
    SendTimeout { attempts: u32, elapsed_ms: u64 },
    /// The ack payload echoed a different value than the one sent.
    AckMismatch { expected: u32, received: u32 },
    /// The transport confirmed the send but no ack payload came back.
    NoAck,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SendTimeout {
                attempts,
                elapsed_ms,
            } => write!(f, "send timed out after {attempts} attempts ({elapsed_ms} ms)"),
            Self::AckMismatch { expected, received } => {
                write!(f, "ack mismatch (sent {expected}, echoed {received})")
            }
            Self::NoAck => write!(f, "no ack payload"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

impl From<crate::app::ports::ConfigError> for Error {
    fn from(e: crate::app::ports::ConfigError) -> Self {
        match e {
            crate::app::ports::ConfigError::ValidationFailed(msg) => Self::Config(msg),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
