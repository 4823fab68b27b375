//! Mock hardware for integration tests.
//!
//! A simulated clock shared by both nodes, a scripted transceiver for
//! single-node tests, a paired "air" that connects two transceivers the way
//! the real chips do (ack payloads ride on the *next* ack), pins that
//! record their writes, and a sink that keeps every event.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};
use pairlink::app::events::NodeEvent;
use pairlink::app::ports::{Clock, EventSink, RadioLink};
use pairlink::protocol::{PACKET_SIZE, Packet};

// ── SimClock ──────────────────────────────────────────────────

/// Monotonic clock that only moves when something delays on it.
#[derive(Clone, Default)]
pub struct SimClock {
    now_us: Rc<Cell<u64>>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at_us(us: u64) -> Self {
        let c = Self::default();
        c.now_us.set(us);
        c
    }

    pub fn advance_ms(&self, ms: u64) {
        self.now_us.set(self.now_us.get() + ms * 1_000);
    }

    pub fn now_ms(&self) -> u64 {
        self.now_us.get() / 1_000
    }
}

impl Clock for SimClock {
    fn uptime_us(&self) -> u64 {
        self.now_us.get()
    }
}

impl DelayNs for SimClock {
    fn delay_ns(&mut self, ns: u32) {
        self.now_us.set(self.now_us.get() + u64::from(ns) / 1_000);
    }

    fn delay_us(&mut self, us: u32) {
        self.now_us.set(self.now_us.get() + u64::from(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance_ms(u64::from(ms));
    }
}

// ── Radio bookkeeping shared by both mocks ────────────────────

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipeSetup {
    pub writing: Option<Vec<u8>>,
    pub reading: Vec<(u8, Vec<u8>)>,
    pub listening: bool,
}

fn word(payload: &[u8]) -> u32 {
    Packet::from_bytes(payload).raw()
}

fn copy_word(value: u32, buf: &mut [u8]) -> usize {
    let bytes = value.to_le_bytes();
    let n = PACKET_SIZE.min(buf.len());
    buf[..n].copy_from_slice(&bytes[..n]);
    n
}

// ── MockRadio (scripted, single node) ─────────────────────────

/// Transceiver whose send outcomes and incoming traffic are scripted.
#[derive(Default)]
pub struct MockRadio {
    /// Outcomes for the next sends; `default_acked` once exhausted.
    pub outcomes: VecDeque<bool>,
    pub default_acked: bool,
    /// Every acked send pushes its own value as an ack payload.
    pub echo_sent: bool,
    /// Ack payloads waiting to be read by the sender.
    pub acks: VecDeque<u32>,
    /// Payloads waiting to be read by a listener, with their pipe.
    pub inbound: VecDeque<(u8, u32)>,
    /// Every send attempt, acked or not.
    pub sent: Vec<u32>,
    /// Ack payloads queued by a listener.
    pub ack_payloads: Vec<(u8, u32)>,
    pub pipes: PipeSetup,
    /// Make the next pipe setup call fail.
    pub fail_setup: bool,
}

impl MockRadio {
    /// Every send is acked and echoed immediately.
    pub fn ideal() -> Self {
        Self {
            default_acked: true,
            echo_sent: true,
            ..Self::default()
        }
    }

    /// No send is ever acked.
    pub fn dead() -> Self {
        Self::default()
    }

    pub fn receive(&mut self, values: &[u32]) {
        self.inbound.extend(values.iter().map(|&v| (1, v)));
    }

    fn setup(&mut self) -> Result<(), &'static str> {
        if self.fail_setup {
            Err("setup failed")
        } else {
            Ok(())
        }
    }
}

impl RadioLink for MockRadio {
    type Error = &'static str;

    fn send(&mut self, payload: &[u8]) -> Result<bool, Self::Error> {
        let value = word(payload);
        self.sent.push(value);
        let acked = self.outcomes.pop_front().unwrap_or(self.default_acked);
        if acked && self.echo_sent {
            self.acks.push_back(value);
        }
        Ok(acked)
    }

    fn available(&mut self) -> Result<Option<u8>, Self::Error> {
        if let Some(&(pipe, _)) = self.inbound.front() {
            return Ok(Some(pipe));
        }
        Ok((!self.acks.is_empty()).then_some(0))
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if let Some((_, v)) = self.inbound.pop_front() {
            return Ok(copy_word(v, buf));
        }
        match self.acks.pop_front() {
            Some(v) => Ok(copy_word(v, buf)),
            None => Err("read with empty FIFO"),
        }
    }

    fn write_ack_payload(&mut self, pipe: u8, payload: &[u8]) -> Result<(), Self::Error> {
        self.ack_payloads.push((pipe, word(payload)));
        Ok(())
    }

    fn is_ack_payload_available(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.acks.is_empty())
    }

    fn start_listening(&mut self) -> Result<(), Self::Error> {
        self.setup()?;
        self.pipes.listening = true;
        Ok(())
    }

    fn stop_listening(&mut self) -> Result<(), Self::Error> {
        self.setup()?;
        self.pipes.listening = false;
        Ok(())
    }

    fn open_writing_pipe(&mut self, address: &[u8]) -> Result<(), Self::Error> {
        self.setup()?;
        self.pipes.writing = Some(address.to_vec());
        Ok(())
    }

    fn open_reading_pipe(&mut self, pipe: u8, address: &[u8]) -> Result<(), Self::Error> {
        self.setup()?;
        self.pipes.reading.push((pipe, address.to_vec()));
        Ok(())
    }
}

// ── Air (paired radios) ───────────────────────────────────────

/// Depth of the transceiver's TX FIFO, which also holds ack payloads.
const ACK_FIFO_DEPTH: usize = 3;

#[derive(Debug)]
pub struct AirState {
    /// When false every transmission is lost.
    pub up: bool,
    to_responder: VecDeque<u32>,
    /// Ack payloads queued by the responder, sent on the next acks.
    ack_fifo: VecDeque<u32>,
    to_initiator: VecDeque<u32>,
    pub delivered: Vec<u32>,
}

#[derive(Clone)]
pub struct Air {
    state: Rc<RefCell<AirState>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Initiator,
    Responder,
}

/// One end of a paired link.
pub struct AirRadio {
    air: Air,
    side: Side,
    pub pipes: PipeSetup,
}

impl Air {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(AirState {
                up: true,
                to_responder: VecDeque::new(),
                ack_fifo: VecDeque::new(),
                to_initiator: VecDeque::new(),
                delivered: Vec::new(),
            })),
        }
    }

    pub fn set_up(&self, up: bool) {
        self.state.borrow_mut().up = up;
    }

    pub fn delivered(&self) -> Vec<u32> {
        self.state.borrow().delivered.clone()
    }

    pub fn initiator(&self) -> AirRadio {
        AirRadio {
            air: self.clone(),
            side: Side::Initiator,
            pipes: PipeSetup::default(),
        }
    }

    pub fn responder(&self) -> AirRadio {
        AirRadio {
            air: self.clone(),
            side: Side::Responder,
            pipes: PipeSetup::default(),
        }
    }
}

impl RadioLink for AirRadio {
    type Error = &'static str;

    fn send(&mut self, payload: &[u8]) -> Result<bool, Self::Error> {
        if self.side != Side::Initiator {
            return Err("responder never transmits");
        }
        let mut air = self.air.state.borrow_mut();
        if !air.up {
            return Ok(false);
        }
        let value = word(payload);
        air.to_responder.push_back(value);
        air.delivered.push(value);
        if let Some(echo) = air.ack_fifo.pop_front() {
            air.to_initiator.push_back(echo);
        }
        Ok(true)
    }

    fn available(&mut self) -> Result<Option<u8>, Self::Error> {
        let air = self.air.state.borrow();
        Ok(match self.side {
            Side::Initiator => (!air.to_initiator.is_empty()).then_some(0),
            Side::Responder => (!air.to_responder.is_empty()).then_some(1),
        })
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut air = self.air.state.borrow_mut();
        let queue = match self.side {
            Side::Initiator => &mut air.to_initiator,
            Side::Responder => &mut air.to_responder,
        };
        queue
            .pop_front()
            .map(|v| copy_word(v, buf))
            .ok_or("read with empty FIFO")
    }

    fn write_ack_payload(&mut self, _pipe: u8, payload: &[u8]) -> Result<(), Self::Error> {
        let mut air = self.air.state.borrow_mut();
        if air.ack_fifo.len() < ACK_FIFO_DEPTH {
            air.ack_fifo.push_back(word(payload));
        }
        Ok(())
    }

    fn is_ack_payload_available(&mut self) -> Result<bool, Self::Error> {
        Ok(self.available()?.is_some())
    }

    fn start_listening(&mut self) -> Result<(), Self::Error> {
        self.pipes.listening = true;
        Ok(())
    }

    fn stop_listening(&mut self) -> Result<(), Self::Error> {
        self.pipes.listening = false;
        Ok(())
    }

    fn open_writing_pipe(&mut self, address: &[u8]) -> Result<(), Self::Error> {
        self.pipes.writing = Some(address.to_vec());
        Ok(())
    }

    fn open_reading_pipe(&mut self, pipe: u8, address: &[u8]) -> Result<(), Self::Error> {
        self.pipes.reading.push((pipe, address.to_vec()));
        Ok(())
    }
}

// ── MockPin ───────────────────────────────────────────────────

/// Pin handle whose level, write count and failure mode are shared with
/// the test through clones.
#[derive(Clone, Default)]
pub struct MockPin {
    level: Rc<Cell<bool>>,
    writes: Rc<Cell<u32>>,
    failing: Rc<Cell<bool>>,
}

impl MockPin {
    pub fn new(high: bool) -> Self {
        let p = Self::default();
        p.level.set(high);
        p
    }

    pub fn set(&self, high: bool) {
        self.level.set(high);
    }

    pub fn level(&self) -> bool {
        self.level.get()
    }

    pub fn writes(&self) -> u32 {
        self.writes.get()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    fn check(&self) -> Result<(), ErrorKind> {
        if self.failing.get() {
            Err(ErrorKind::Other)
        } else {
            Ok(())
        }
    }

    fn write(&mut self, high: bool) -> Result<(), ErrorKind> {
        self.check()?;
        self.writes.set(self.writes.get() + 1);
        self.level.set(high);
        Ok(())
    }
}

impl ErrorType for MockPin {
    type Error = ErrorKind;
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, ErrorKind> {
        self.check()?;
        Ok(self.level.get())
    }

    fn is_low(&mut self) -> Result<bool, ErrorKind> {
        self.is_high().map(|h| !h)
    }
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), ErrorKind> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), ErrorKind> {
        self.write(true)
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<NodeEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&NodeEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn last_status(&self) -> Option<&pairlink::status::StatusReport> {
        self.events.iter().rev().find_map(|e| match e {
            NodeEvent::Status(r) => Some(r),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &NodeEvent) {
        self.events.push(event.clone());
    }
}
