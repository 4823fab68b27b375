//! Application boundary — ports and events.
//!
//! The link protocol itself lives in [`crate::protocol`], [`crate::health`],
//! [`crate::control`], and [`crate::node`].  Everything it needs from the
//! outside world is expressed as a **port trait** in [`ports`], and
//! everything it reports flows out as an [`events::NodeEvent`].

pub mod events;
pub mod ports;
