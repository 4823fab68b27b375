//! Responder cycle: drain and ack everything pending, then settle the relay.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{debug, error, info, warn};

use super::{SyncCycle, report_link_edge};
use crate::app::events::NodeEvent;
use crate::app::ports::{Clock, EventSink, RadioLink};
use crate::config::LinkConfig;
use crate::control::RelayState;
use crate::control::relay::RelayController;
use crate::error::Error;
use crate::health::{LinkStatus, ReceiveWatchdog};
use crate::protocol::{PACKET_SIZE, Packet};
use crate::role::Role;
use crate::status::{LinkStats, StatusReport};

/// Upper bound on payloads drained in one tick.
pub const MAX_DRAIN_PER_TICK: usize = 32;

/// Everything the Responder carries from one tick to the next.
#[derive(Debug, Clone, Copy)]
pub struct ResponderState {
    pub watchdog: ReceiveWatchdog,
    /// Latest remote command heard while the link was up. Cleared on link
    /// loss so a recovered link waits for a fresh command.
    pub command: Option<RelayState>,
    /// Raw word of the last decoded control packet.
    pub last_raw: Option<u32>,
    pub stats: LinkStats,
    /// Link status as last reported to the sink.
    pub reported: LinkStatus,
}

impl ResponderState {
    pub fn new(config: &LinkConfig, now_ms: u64) -> Self {
        let watchdog =
            ReceiveWatchdog::new(config.link_timeout_ms, config.responder_start_linked, now_ms);
        Self {
            watchdog,
            command: None,
            last_raw: None,
            stats: LinkStats::default(),
            reported: watchdog.status(now_ms),
        }
    }
}

pub struct ResponderNode<R, P> {
    radio: R,
    relay: RelayController<P>,
    config: LinkConfig,
    state: ResponderState,
}

impl<R: RadioLink, P: OutputPin> ResponderNode<R, P> {
    /// Takes the relay pin and drives it to the safe state immediately.
    pub fn new(radio: R, relay_pin: P, config: &LinkConfig) -> Self {
        Self {
            radio,
            relay: RelayController::new(relay_pin, config.safe_state),
            config: config.clone(),
            state: ResponderState::new(config, 0),
        }
    }

    pub fn state(&self) -> &ResponderState {
        &self.state
    }

    pub fn relay(&self) -> &RelayController<P> {
        &self.relay
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    /// Pop every pending payload, ack it with its own value, and return the
    /// last control command among them.
    fn drain<T: Clock>(&mut self, time: &T) -> Option<RelayState> {
        let mut decoded = None;
        for _ in 0..MAX_DRAIN_PER_TICK {
            let pipe = match self.radio.available() {
                Ok(Some(pipe)) => pipe,
                Ok(None) => break,
                Err(e) => {
                    warn!("Radio poll error: {:?}", e);
                    break;
                }
            };
            let mut buf = [0u8; PACKET_SIZE];
            let n = match self.radio.read(&mut buf) {
                Ok(n) => n.min(PACKET_SIZE),
                Err(e) => {
                    warn!("Radio read error: {:?}", e);
                    break;
                }
            };
            let packet = Packet::from_bytes(&buf[..n]);
            if let Err(e) = self.radio.write_ack_payload(pipe, &packet.to_bytes()) {
                warn!("Ack payload for {} not queued: {:?}", packet.raw(), e);
            }
            self.state.watchdog.record_receipt(time.uptime_ms());
            self.state.stats.packets_received = self.state.stats.packets_received.saturating_add(1);
            debug!("Received and acked {} on pipe {}", packet.raw(), pipe);

            if let Packet::Control(state) = packet {
                decoded = Some(state);
                self.state.last_raw = Some(packet.raw());
                self.state.stats.control_applied = self.state.stats.control_applied.saturating_add(1);
            }
        }
        decoded
    }
}

impl<R: RadioLink, P: OutputPin> SyncCycle for ResponderNode<R, P> {
    fn start<T: Clock>(&mut self, time: &mut T, sink: &mut impl EventSink) -> Result<(), Error> {
        let setup = self
            .radio
            .open_writing_pipe(&self.config.backward_address)
            .and_then(|()| self.radio.open_reading_pipe(1, &self.config.forward_address))
            .and_then(|()| self.radio.start_listening());
        if let Err(e) = setup {
            error!("Responder radio setup failed: {:?}", e);
            return Err(Error::Radio("pipe setup failed"));
        }
        self.state = ResponderState::new(&self.config, time.uptime_ms());
        info!(
            "PEK Receiver ready (relay {}, link {})",
            self.relay.state(),
            self.state.reported
        );
        sink.emit(&NodeEvent::Started(Role::Responder));
        Ok(())
    }

    fn tick<T: Clock + DelayNs>(&mut self, time: &mut T, sink: &mut impl EventSink) -> LinkStatus {
        let decoded = self.drain(time);

        let now = time.uptime_ms();
        let link = self.state.watchdog.status(now);
        if link.is_down() {
            self.state.command = None;
        } else if decoded.is_some() {
            self.state.command = decoded;
        }

        let before = self.relay.state();
        let t = self.relay.apply(self.state.command, link.is_down());
        if t.changed {
            sink.emit(&NodeEvent::RelayChanged {
                from: before,
                to: t.state,
            });
        }

        let since = self.state.watchdog.since_last_rx(now);
        debug!("Millis since last signal: {:?}", since);
        report_link_edge(&mut self.state.reported, link, sink);

        let mut report = StatusReport::new(Role::Responder, link, self.state.stats);
        report.relay = Some(self.relay.state());
        report.last_raw = self.state.last_raw;
        report.since_last_rx_ms = since;
        sink.emit(&NodeEvent::Status(report));
        link
    }

    fn role(&self) -> Role {
        Role::Responder
    }
}
