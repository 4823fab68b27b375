//! Per-tick sync cycles for the two ends of the pair.
//!
//! ```text
//!  Initiator                                   Responder
//!  ─────────                                   ─────────
//!  input pin ─▶ sync + control ─▶ delivery ~~▶ drain + ack ─▶ relay pin
//!                   │                               │
//!             FailureCounter                  ReceiveWatchdog
//!                   └──────────▶ EventSink ◀────────┘
//! ```
//!
//! The role is chosen once at boot; after that the main loop only ever
//! calls [`SyncCycle::tick`] on the one node it built.  Each node owns an
//! explicit state record that every tick reads and updates.  Nothing is
//! global, and all state is settled before the tick's status is emitted.

pub mod initiator;
pub mod responder;

use embedded_hal::delay::DelayNs;

use crate::app::ports::{Clock, EventSink};
use crate::health::LinkStatus;
use crate::role::Role;

pub use initiator::{InitiatorNode, InitiatorState};
pub use responder::{ResponderNode, ResponderState};

/// One role's tick behaviour.
pub trait SyncCycle {
    /// Radio setup and the boot event. Call once before the first tick.
    fn start<T: Clock>(
        &mut self,
        time: &mut T,
        sink: &mut impl EventSink,
    ) -> Result<(), crate::error::Error>;

    /// Run one full cycle and return the link health it ended with.
    fn tick<T: Clock + DelayNs>(&mut self, time: &mut T, sink: &mut impl EventSink) -> LinkStatus;

    fn role(&self) -> Role;
}

/// Emit `LinkChanged` when `now` differs from the last reported status.
pub(crate) fn report_link_edge(
    reported: &mut LinkStatus,
    now: LinkStatus,
    sink: &mut impl EventSink,
) {
    if *reported != now {
        *reported = now;
        sink.emit(&crate::app::events::NodeEvent::LinkChanged(now));
    }
}
