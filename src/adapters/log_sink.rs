//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing node events to the ESP-IDF logger
//! (UART / USB-CDC in production).  Status reports arrive every tick, so the
//! rendered status lines are only logged when they differ from the last ones
//! written.

use log::{info, warn};

use crate::app::events::NodeEvent;
use crate::app::ports::EventSink;
use crate::status::StatusLine;

/// Adapter that logs every [`NodeEvent`] to the serial console.
pub struct LogEventSink {
    last_lines: Option<[StatusLine; 4]>,
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogEventSink {
    pub fn new() -> Self {
        Self { last_lines: None }
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &NodeEvent) {
        match event {
            NodeEvent::Started(role) => {
                info!("START | role={}", role);
            }
            NodeEvent::LinkChanged(link) => {
                info!("LINK  | {}", link);
            }
            NodeEvent::RelayChanged { from, to } => {
                info!("RELAY | {} -> {}", from, to);
            }
            NodeEvent::DeliveryFailed(e) => {
                warn!("SEND  | {}", e);
            }
            NodeEvent::AckMismatch { expected, received } => {
                warn!("ACK   | sent {} echoed {}", expected, received);
            }
            NodeEvent::Status(report) => {
                let lines = report.render_lines();
                if self.last_lines.as_ref() != Some(&lines) {
                    for line in lines.iter().filter(|l| !l.is_empty()) {
                        info!("DISP  | {}", line);
                    }
                    let s = &report.stats;
                    info!(
                        "STATS | sent={} retries={} timeouts={} ack_ok={} ack_mismatch={} \
                         rx={} control={}",
                        s.packets_sent,
                        s.send_retries,
                        s.send_timeouts,
                        s.ack_matches,
                        s.ack_mismatches,
                        s.packets_received,
                        s.control_applied,
                    );
                    self.last_lines = Some(lines);
                }
            }
        }
    }
}
