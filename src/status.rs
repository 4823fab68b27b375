//! Status reporting.
//!
//! A [`StatusReport`] is assembled at the end of every tick, after all link
//! and relay state has been updated, and handed to the event sink.  It is
//! human-oriented; there is no machine-readable schema.
//!
//! [`StatusReport::render_lines`] lays the report out for a 128x64 text
//! display (four rows of 21 columns):
//!
//! ```text
//! PEK Receiver  v0.3.0
//! Link: OK
//! Relay: ON
//! Last: 1
//! ```

use core::fmt::Write;

use heapless::String;

use crate::control::RelayState;
use crate::health::LinkStatus;
use crate::role::Role;

/// Columns available on one display row.
pub const LINE_WIDTH: usize = 21;

/// One rendered display row.
pub type StatusLine = String<LINE_WIDTH>;

/// Running traffic counters, reset only at boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Packets handed to the transport (successful deliveries).
    pub packets_sent: u32,
    /// Transport send attempts that had to be repeated.
    pub send_retries: u32,
    /// Deliveries abandoned at the deadline.
    pub send_timeouts: u32,
    /// Ack payloads that echoed the sent value.
    pub ack_matches: u32,
    /// Ack payloads that echoed something else.
    pub ack_mismatches: u32,
    /// Packets drained from the receive FIFO.
    pub packets_received: u32,
    /// Control packets decoded into a relay command.
    pub control_applied: u32,
}

/// End-of-tick snapshot for the status display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub role: Role,
    pub version: &'static str,
    pub link: LinkStatus,
    /// Relay position (Responder only).
    pub relay: Option<RelayState>,
    /// Last raw control word decoded (Responder) or sent (Initiator).
    pub last_raw: Option<u32>,
    /// Consecutive delivery failures (Initiator only).
    pub failures: Option<u8>,
    /// Milliseconds since the last received packet (Responder only).
    pub since_last_rx_ms: Option<u64>,
    pub stats: LinkStats,
}

impl StatusReport {
    pub fn new(role: Role, link: LinkStatus, stats: LinkStats) -> Self {
        Self {
            role,
            version: env!("CARGO_PKG_VERSION"),
            link,
            relay: None,
            last_raw: None,
            failures: None,
            since_last_rx_ms: None,
            stats,
        }
    }

    /// Render the report as display rows. Text that does not fit is cut at
    /// the row width.
    pub fn render_lines(&self) -> [StatusLine; 4] {
        let mut lines: [StatusLine; 4] = Default::default();
        put(&mut lines[0], format_args!("PEK {} v{}", self.role, self.version));
        put(&mut lines[1], format_args!("Link: {}", self.link));
        match (self.relay, self.failures) {
            (Some(relay), _) => put(&mut lines[2], format_args!("Relay: {}", relay)),
            (None, Some(n)) => put(&mut lines[2], format_args!("Lost: {}", n)),
            (None, None) => {}
        }
        if let Some(raw) = self.last_raw {
            put(&mut lines[3], format_args!("Last: {}", raw));
        }
        lines
    }
}

/// Write into a fixed row, truncating instead of failing on overflow.
fn put(line: &mut StatusLine, args: core::fmt::Arguments<'_>) {
    struct Truncate<'a>(&'a mut StatusLine);

    impl Write for Truncate<'_> {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            for c in s.chars() {
                if self.0.push(c).is_err() {
                    break;
                }
            }
            Ok(())
        }
    }

    let _ = Truncate(line).write_fmt(args);
}
