//! Link health monitor.
//!
//! Each role judges the link differently:
//!
//! - **Initiator** counts consecutive delivery failures in a saturating
//!   counter.  `0` is CONNECTED, `1..max` is DEGRADED, `max` is
//!   DISCONNECTED.  One successful delivery drops straight back to
//!   CONNECTED; nothing is terminal.
//! - **Responder** has no way to send on its own, so it watches the time
//!   since the last packet of either class.  Silence of `timeout_ms` or
//!   longer is DISCONNECTED; any packet is CONNECTED again.
//!
//! Link-down is an accumulated condition, never a single event.  The
//! monitors log only on the edges.

use log::{info, warn};

/// Coarse up/down view used by the status report and the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Up,
    Down,
}

impl LinkStatus {
    pub const fn is_down(self) -> bool {
        matches!(self, Self::Down)
    }
}

impl core::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Up => write!(f, "OK"),
            Self::Down => write!(f, "NO CONNECTION"),
        }
    }
}

/// Initiator link state, derived from the failure count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitiatorLinkState {
    Connected,
    /// Carries the current consecutive failure count (`1..max`).
    Degraded(u8),
    Disconnected,
}

// ---------------------------------------------------------------------------
// Initiator: saturating failure counter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct FailureCounter {
    count: u8,
    max: u8,
}

impl FailureCounter {
    /// A counter that starts CONNECTED (`linked`) or DISCONNECTED.
    pub fn new(max: u8, linked: bool) -> Self {
        Self {
            count: if linked { 0 } else { max },
            max,
        }
    }

    pub fn record_failure(&mut self) {
        if self.count < self.max {
            self.count += 1;
            if self.count == self.max {
                warn!("Link: {} consecutive failures, declaring link down", self.count);
            }
        }
    }

    pub fn record_success(&mut self) {
        if self.count == self.max {
            info!("Link: delivery confirmed, link restored");
        }
        self.count = 0;
    }

    pub fn count(&self) -> u8 {
        self.count
    }

    pub fn state(&self) -> InitiatorLinkState {
        match self.count {
            0 => InitiatorLinkState::Connected,
            n if n >= self.max => InitiatorLinkState::Disconnected,
            n => InitiatorLinkState::Degraded(n),
        }
    }

    pub fn status(&self) -> LinkStatus {
        if self.count >= self.max {
            LinkStatus::Down
        } else {
            LinkStatus::Up
        }
    }
}

// ---------------------------------------------------------------------------
// Responder: receive timeout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct ReceiveWatchdog {
    /// Uptime (ms) of the most recent packet; `None` until the first one.
    last_rx_ms: Option<u64>,
    timeout_ms: u64,
}

impl ReceiveWatchdog {
    /// When `linked`, the boot time counts as a receipt so the link starts up
    /// and only drops after a full timeout of silence.
    pub fn new(timeout_ms: u32, linked: bool, now_ms: u64) -> Self {
        Self {
            last_rx_ms: linked.then_some(now_ms),
            timeout_ms: timeout_ms as u64,
        }
    }

    pub fn record_receipt(&mut self, now_ms: u64) {
        self.last_rx_ms = Some(now_ms);
    }

    /// Milliseconds since the last packet, `None` if nothing was ever heard.
    pub fn since_last_rx(&self, now_ms: u64) -> Option<u64> {
        self.last_rx_ms.map(|t| now_ms.saturating_sub(t))
    }

    pub fn status(&self, now_ms: u64) -> LinkStatus {
        match self.since_last_rx(now_ms) {
            Some(elapsed) if elapsed < self.timeout_ms => LinkStatus::Up,
            _ => LinkStatus::Down,
        }
    }
}
