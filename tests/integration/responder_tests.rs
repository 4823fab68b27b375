//! Responder cycle against scripted incoming traffic.

use super::mock_hw::{MockPin, MockRadio, RecordingSink, SimClock};

use pairlink::app::events::NodeEvent;
use pairlink::config::LinkConfig;
use pairlink::control::RelayState;
use pairlink::health::LinkStatus;
use pairlink::node::responder::MAX_DRAIN_PER_TICK;
use pairlink::node::{ResponderNode, SyncCycle};
use pairlink::role::Role;
use proptest::prelude::*;

struct Rig {
    node: ResponderNode<MockRadio, MockPin>,
    relay: MockPin,
    time: SimClock,
    sink: RecordingSink,
}

impl Rig {
    fn new(config: &LinkConfig) -> Self {
        let relay = MockPin::new(false);
        let mut time = SimClock::new();
        let mut sink = RecordingSink::new();
        let mut node = ResponderNode::new(MockRadio::ideal(), relay.clone(), config);
        node.start(&mut time, &mut sink).unwrap();
        Self {
            node,
            relay,
            time,
            sink,
        }
    }

    fn tick_with(&mut self, incoming: &[u32]) -> LinkStatus {
        self.node.radio_mut().receive(incoming);
        self.node.tick(&mut self.time, &mut self.sink)
    }

    fn relay_changes(&self) -> usize {
        self.sink.count(|e| matches!(e, NodeEvent::RelayChanged { .. }))
    }
}

fn rig() -> Rig {
    Rig::new(&LinkConfig::default())
}

// ── Setup ─────────────────────────────────────────────────────

#[test]
fn start_listens_for_the_initiator() {
    let r = rig();
    let pipes = &r.node.radio().pipes;
    assert_eq!(pipes.writing.as_deref(), Some(&b"Backw"[..]));
    assert_eq!(pipes.reading, vec![(1, b"Forwd".to_vec())]);
    assert!(pipes.listening);
    assert!(r.sink.events.contains(&NodeEvent::Started(Role::Responder)));
}

#[test]
fn relay_is_driven_safe_at_construction() {
    let r = rig();
    assert_eq!(r.relay.writes(), 1);
    assert!(!r.relay.level());
    assert_eq!(r.node.relay().state(), RelayState::Off);
    assert_eq!(r.node.state().reported, LinkStatus::Down);
}

#[test]
fn safe_state_can_be_on() {
    let config = LinkConfig {
        safe_state: RelayState::On,
        ..LinkConfig::default()
    };
    let mut r = Rig::new(&config);
    assert!(r.relay.level());

    r.tick_with(&[0]);
    assert!(!r.relay.level());
    r.time.advance_ms(10_050);
    r.tick_with(&[]);
    assert!(r.relay.level(), "silence must restore the configured safe state");
}

// ── Control ───────────────────────────────────────────────────

#[test]
fn control_on_energises_relay_and_echoes_every_packet() {
    let mut r = rig();
    assert_eq!(r.tick_with(&[300, 1]), LinkStatus::Up);

    assert!(r.relay.level());
    assert_eq!(r.node.radio().ack_payloads, vec![(1, 300), (1, 1)]);
    assert!(r.sink.events.contains(&NodeEvent::RelayChanged {
        from: RelayState::Off,
        to: RelayState::On,
    }));
    assert!(r.sink.events.contains(&NodeEvent::LinkChanged(LinkStatus::Up)));

    let status = r.sink.last_status().unwrap();
    assert_eq!(status.relay, Some(RelayState::On));
    assert_eq!(status.last_raw, Some(1));
    assert_eq!(status.render_lines()[2].as_str(), "Relay: ON");
}

#[test]
fn on_then_off_in_one_tick_ends_off_without_toggling() {
    let mut r = rig();
    r.tick_with(&[1, 0]);

    assert_eq!(r.node.relay().state(), RelayState::Off);
    assert_eq!(r.relay.writes(), 1, "only the boot write");
    assert_eq!(r.relay_changes(), 0);
    assert_eq!(r.node.state().stats.control_applied, 2);
    assert_eq!(r.node.state().last_raw, Some(0));
}

#[test]
fn repeated_command_writes_the_pin_once() {
    let mut r = rig();
    for _ in 0..3 {
        r.tick_with(&[1]);
        r.tick_with(&[]);
    }

    assert_eq!(r.relay.writes(), 2);
    assert_eq!(r.relay_changes(), 1);
}

#[test]
fn reserved_values_refresh_the_link_but_not_the_relay() {
    let mut r = rig();
    assert_eq!(r.tick_with(&[2, 255]), LinkStatus::Up);

    assert_eq!(r.node.relay().state(), RelayState::Off);
    assert_eq!(r.node.state().last_raw, None);
    assert_eq!(r.node.state().stats.packets_received, 2);
    assert_eq!(r.node.radio().ack_payloads, vec![(1, 2), (1, 255)]);
}

#[test]
fn failed_relay_write_is_retried_next_tick() {
    let mut r = rig();
    r.relay.set_failing(true);
    r.tick_with(&[1]);
    assert_eq!(r.node.relay().state(), RelayState::Off);
    assert_eq!(r.relay_changes(), 0);

    r.relay.set_failing(false);
    r.tick_with(&[]);
    assert_eq!(r.node.relay().state(), RelayState::On);
    assert!(r.relay.level());
}

// ── Receive timeout ───────────────────────────────────────────

#[test]
fn silence_past_timeout_forces_safe_state() {
    let mut r = rig();
    r.tick_with(&[1]);
    assert!(r.relay.level());

    r.time.advance_ms(9_999);
    assert_eq!(r.tick_with(&[]), LinkStatus::Up);
    assert!(r.relay.level());

    r.time.advance_ms(51);
    assert_eq!(r.tick_with(&[]), LinkStatus::Down);
    assert!(!r.relay.level());
    assert!(r.sink.events.contains(&NodeEvent::LinkChanged(LinkStatus::Down)));

    let status = r.sink.last_status().unwrap();
    assert_eq!(status.since_last_rx_ms, Some(10_050));
    assert_eq!(status.render_lines()[1].as_str(), "Link: NO CONNECTION");
}

#[test]
fn keep_alives_hold_the_last_command() {
    let mut r = rig();
    r.tick_with(&[1]);
    for k in 0..5u32 {
        r.time.advance_ms(6_000);
        assert_eq!(r.tick_with(&[1_000 + k]), LinkStatus::Up);
    }
    assert!(r.relay.level());
    assert_eq!(r.relay.writes(), 2);
}

#[test]
fn recovered_link_waits_for_a_fresh_command() {
    let mut r = rig();
    r.tick_with(&[1]);
    r.time.advance_ms(10_050);
    r.tick_with(&[]);
    assert!(!r.relay.level());

    assert_eq!(r.tick_with(&[400]), LinkStatus::Up);
    assert!(!r.relay.level(), "sync alone must not restore the old command");
    assert_eq!(r.node.state().command, None);

    r.tick_with(&[1]);
    assert!(r.relay.level());
}

#[test]
fn linked_boot_counts_as_a_receipt() {
    let config = LinkConfig {
        responder_start_linked: true,
        ..LinkConfig::default()
    };
    let mut r = Rig::new(&config);
    assert_eq!(r.tick_with(&[]), LinkStatus::Up);
    r.time.advance_ms(10_000);
    assert_eq!(r.tick_with(&[]), LinkStatus::Down);
}

// ── Duplicate delivery ────────────────────────────────────────

proptest! {
    /// Receiving a control value N times, in one burst or one per tick,
    /// leaves the Responder where a single delivery would, while every
    /// copy is still echoed.
    #[test]
    fn duplicated_control_matches_single_delivery(
        value in 0u32..=1,
        copies in 1usize..=8,
        spread in any::<bool>(),
    ) {
        let mut once = rig();
        once.tick_with(&[value]);

        let mut many = rig();
        if spread {
            for _ in 0..copies {
                many.tick_with(&[value]);
            }
        } else {
            many.tick_with(&vec![value; copies]);
        }

        prop_assert_eq!(many.node.relay().state(), once.node.relay().state());
        prop_assert_eq!(many.relay.level(), once.relay.level());
        prop_assert_eq!(many.relay.writes(), once.relay.writes());
        prop_assert_eq!(many.relay_changes(), once.relay_changes());
        prop_assert_eq!(many.node.state().command, once.node.state().command);
        prop_assert_eq!(many.node.state().last_raw, once.node.state().last_raw);
        prop_assert_eq!(many.node.state().reported, once.node.state().reported);
        prop_assert_eq!(&many.node.radio().ack_payloads, &vec![(1u8, value); copies]);
        prop_assert_eq!(&once.node.radio().ack_payloads, &vec![(1u8, value)]);
    }
}

// ── Drain ─────────────────────────────────────────────────────

#[test]
fn drain_is_bounded_per_tick() {
    let mut r = rig();
    let burst: Vec<u32> = (0..40).map(|k| 256 + k).collect();
    r.tick_with(&burst);

    assert_eq!(r.node.state().stats.packets_received, MAX_DRAIN_PER_TICK as u32);
    assert_eq!(r.node.radio().inbound.len(), 40 - MAX_DRAIN_PER_TICK);

    r.tick_with(&[]);
    assert!(r.node.radio().inbound.is_empty());
}
