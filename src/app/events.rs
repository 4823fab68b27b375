//! Outbound node events.
//!
//! The node cycles emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them — log to serial, redraw a display, etc.

use crate::control::RelayState;
use crate::error::LinkError;
use crate::health::LinkStatus;
use crate::role::Role;
use crate::status::StatusReport;

/// Structured events emitted by the node cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEvent {
    /// The node finished setup in the given role.
    Started(Role),

    /// Link health crossed between up and down.
    LinkChanged(LinkStatus),

    /// The relay output was physically switched.
    RelayChanged { from: RelayState, to: RelayState },

    /// A packet could not be delivered this tick.
    DeliveryFailed(LinkError),

    /// The peer echoed a different value than the one sent.
    AckMismatch { expected: u32, received: u32 },

    /// End-of-tick status snapshot, rendered after all state is updated.
    Status(StatusReport),
}
