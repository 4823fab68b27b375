//! One-time role selection at boot.
//!
//! The role pin has a pull-up: left open it reads HIGH and the board becomes
//! the Initiator (reads the local input, transmits); strapped to ground it
//! reads LOW and the board becomes the Responder (drives the relay).

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use log::info;

/// Which end of the pair this board is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

impl Role {
    pub const fn from_level(high: bool) -> Self {
        if high { Self::Initiator } else { Self::Responder }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Initiator => "Transmitter",
            Self::Responder => "Receiver",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Let the pull-up settle, then sample the role pin once.
pub fn select_role<P: InputPin>(
    pin: &mut P,
    delay: &mut impl DelayNs,
    settle_ms: u32,
) -> Result<Role, P::Error> {
    delay.delay_ms(settle_ms);
    let role = Role::from_level(pin.is_high()?);
    info!("Role pin sampled after {} ms: {}", settle_ms, role);
    Ok(role)
}
