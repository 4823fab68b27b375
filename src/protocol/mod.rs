//! Link protocol primitives: the wire packet and reliable delivery.

pub mod delivery;
pub mod packet;

pub use delivery::{AckStatus, Delivery, RetryPolicy, deliver};
pub use packet::{PACKET_SIZE, Packet, SYNC_FLOOR};
