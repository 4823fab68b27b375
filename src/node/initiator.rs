//! Initiator cycle: keep-alive, then the local input as a control packet.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use log::{debug, error, info, warn};

use super::{SyncCycle, report_link_edge};
use crate::app::events::NodeEvent;
use crate::app::ports::{Clock, EventSink, RadioLink};
use crate::config::LinkConfig;
use crate::control::RelayState;
use crate::error::{Error, LinkError};
use crate::health::{FailureCounter, LinkStatus};
use crate::protocol::{AckStatus, Delivery, Packet, RetryPolicy, deliver};
use crate::role::Role;
use crate::status::{LinkStats, StatusReport};

/// Everything the Initiator carries from one tick to the next.
#[derive(Debug, Clone, Copy)]
pub struct InitiatorState {
    pub failures: FailureCounter,
    pub stats: LinkStats,
    /// Last control value handed to the transport.
    pub last_control: Option<RelayState>,
    /// Link status as last reported to the sink.
    pub reported: LinkStatus,
}

impl InitiatorState {
    pub fn new(config: &LinkConfig) -> Self {
        let failures = FailureCounter::new(config.max_lost, config.initiator_start_linked);
        Self {
            failures,
            stats: LinkStats::default(),
            last_control: None,
            reported: failures.status(),
        }
    }
}

pub struct InitiatorNode<R, I> {
    radio: R,
    input: I,
    policy: RetryPolicy,
    forward_address: [u8; crate::config::ADDRESS_WIDTH],
    backward_address: [u8; crate::config::ADDRESS_WIDTH],
    state: InitiatorState,
}

impl<R: RadioLink, I: InputPin> InitiatorNode<R, I> {
    pub fn new(radio: R, input: I, config: &LinkConfig) -> Self {
        Self {
            radio,
            input,
            policy: RetryPolicy::from(config),
            forward_address: config.forward_address,
            backward_address: config.backward_address,
            state: InitiatorState::new(config),
        }
    }

    pub fn state(&self) -> &InitiatorState {
        &self.state
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    /// Deliver one packet and fold the outcome into the state record.
    fn send<T: Clock + DelayNs>(
        &mut self,
        packet: Packet,
        time: &mut T,
        sink: &mut impl EventSink,
    ) -> Result<Delivery, LinkError> {
        let result = deliver(&mut self.radio, time, &self.policy, packet);
        let stats = &mut self.state.stats;
        match result {
            Ok(d) => {
                stats.packets_sent = stats.packets_sent.saturating_add(1);
                stats.send_retries = stats.send_retries.saturating_add(d.retries());
                match d.ack {
                    AckStatus::Matched => {
                        stats.ack_matches = stats.ack_matches.saturating_add(1);
                    }
                    AckStatus::Mismatched(received) => {
                        stats.ack_mismatches = stats.ack_mismatches.saturating_add(1);
                        sink.emit(&NodeEvent::AckMismatch {
                            expected: packet.raw(),
                            received,
                        });
                    }
                    AckStatus::Missing => {}
                }
                self.state.failures.record_success();
            }
            Err(e) => {
                match e {
                    LinkError::SendTimeout { .. } => {
                        stats.send_timeouts = stats.send_timeouts.saturating_add(1);
                    }
                    LinkError::AckMismatch { .. } => {
                        stats.ack_mismatches = stats.ack_mismatches.saturating_add(1);
                    }
                    LinkError::NoAck => {}
                }
                sink.emit(&NodeEvent::DeliveryFailed(e));
                self.state.failures.record_failure();
            }
        }
        debug!("Failure count = {}", self.state.failures.count());
        result
    }

    fn finish(&mut self, sink: &mut impl EventSink) -> LinkStatus {
        let link = self.state.failures.status();
        report_link_edge(&mut self.state.reported, link, sink);
        let mut report = StatusReport::new(Role::Initiator, link, self.state.stats);
        report.failures = Some(self.state.failures.count());
        report.last_raw = self.state.last_control.map(|s| Packet::control(s).raw());
        sink.emit(&NodeEvent::Status(report));
        link
    }
}

impl<R: RadioLink, I: InputPin> SyncCycle for InitiatorNode<R, I> {
    fn start<T: Clock>(&mut self, _time: &mut T, sink: &mut impl EventSink) -> Result<(), Error> {
        let setup = self
            .radio
            .open_writing_pipe(&self.forward_address)
            .and_then(|()| self.radio.open_reading_pipe(1, &self.backward_address))
            .and_then(|()| self.radio.stop_listening());
        if let Err(e) = setup {
            error!("Initiator radio setup failed: {:?}", e);
            return Err(Error::Radio("pipe setup failed"));
        }
        info!("PEK Transmitter ready (link {})", self.state.failures.status());
        sink.emit(&NodeEvent::Started(Role::Initiator));
        Ok(())
    }

    fn tick<T: Clock + DelayNs>(&mut self, time: &mut T, sink: &mut impl EventSink) -> LinkStatus {
        // 1. Keep-alive
        let sync = Packet::sync(time.uptime_us() as u32);
        debug!("Sending sync {}", sync.raw());
        let _ = self.send(sync, time, sink);

        if self.state.failures.status().is_down() {
            warn!("No connection to the receiver, control packet skipped");
            return self.finish(sink);
        }

        // 2. Control
        match self.input.is_high() {
            Ok(high) => {
                let state = RelayState::from_level(high);
                let control = Packet::control(state);
                if self.send(control, time, sink).is_ok() {
                    debug!("Control packet {} sent", control.raw());
                }
                self.state.last_control = Some(state);
            }
            Err(e) => {
                warn!("Input read failed ({:?}), control packet skipped", e);
            }
        }

        self.finish(sink)
    }

    fn role(&self) -> Role {
        Role::Initiator
    }
}
