//! Relay control state machine.
//!
//! The transition is a pure function of the decoded remote command, the
//! link health, and the previous output:
//!
//! ```text
//!   link down ──────────────────────────▶ safe state
//!   link up, command seen ─────────────▶ command
//!   link up, no command yet ───────────▶ previous output
//! ```
//!
//! The physical pin is written only when the result differs from the
//! previous output, so repeated identical commands (retransmissions,
//! keep-alive ticks) never touch the relay.

use embedded_hal::digital::OutputPin;
use log::{error, info};

use super::RelayState;

/// Outcome of one control step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub state: RelayState,
    pub changed: bool,
}

/// Pure transition rule.
pub fn transition(
    decoded: Option<RelayState>,
    link_down: bool,
    previous: RelayState,
    safe_state: RelayState,
) -> Transition {
    let state = if link_down {
        safe_state
    } else {
        decoded.unwrap_or(previous)
    };
    Transition {
        state,
        changed: state != previous,
    }
}

/// Owns the relay pin and the last position written to it.
pub struct RelayController<P> {
    pin: P,
    current: RelayState,
    safe_state: RelayState,
    writes: u32,
}

impl<P: OutputPin> RelayController<P> {
    /// Take ownership of the pin and drive it to the safe state.
    pub fn new(pin: P, safe_state: RelayState) -> Self {
        let mut ctl = Self {
            pin,
            current: safe_state,
            safe_state,
            writes: 0,
        };
        if ctl.drive(safe_state).is_err() {
            error!("Relay: failed to drive initial safe state {}", safe_state);
        }
        ctl
    }

    /// Apply one control step. Returns the transition actually committed.
    ///
    /// A failed pin write leaves `current` untouched so the next tick sees
    /// the same difference and retries.
    pub fn apply(&mut self, decoded: Option<RelayState>, link_down: bool) -> Transition {
        let t = transition(decoded, link_down, self.current, self.safe_state);
        if !t.changed {
            return t;
        }
        match self.drive(t.state) {
            Ok(()) => {
                info!("Relay: {} -> {}", self.current, t.state);
                self.current = t.state;
                t
            }
            Err(()) => {
                error!("Relay: write {} failed, holding {}", t.state, self.current);
                Transition {
                    state: self.current,
                    changed: false,
                }
            }
        }
    }

    pub fn state(&self) -> RelayState {
        self.current
    }

    /// Physical writes issued since construction (including the initial one).
    pub fn write_count(&self) -> u32 {
        self.writes
    }

    fn drive(&mut self, state: RelayState) -> Result<(), ()> {
        self.writes = self.writes.saturating_add(1);
        let res = match state {
            RelayState::On => self.pin.set_high(),
            RelayState::Off => self.pin.set_low(),
        };
        res.map_err(|_| ())
    }
}
