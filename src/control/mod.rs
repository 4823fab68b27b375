//! Output control — the Responder's relay.

pub mod relay;

use serde::{Deserialize, Serialize};

/// Physical relay position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelayState {
    Off,
    On,
}

impl RelayState {
    pub const fn from_level(high: bool) -> Self {
        if high { Self::On } else { Self::Off }
    }

    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

impl core::fmt::Display for RelayState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Off => write!(f, "OFF"),
            Self::On => write!(f, "ON"),
        }
    }
}
