//! Live feedback channel: per-product fan-out of feedback events over
//! WebSocket.

mod connection;
pub mod hub;
pub mod protocol;

pub use connection::serve_connection;
pub use hub::{LiveHub, Registration};
pub use protocol::{Inbound, Outbound, ProtocolError, parse_inbound};
