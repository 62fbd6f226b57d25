//! # huddle-transport
//!
//! WebSocket transport client for the DevHuddle chat gateway.
//!
//! The crate revolves around [`ConnectionManager`]: it owns one socket to the
//! gateway, performs the authentication handshake, keeps the connection warm
//! with a periodic heartbeat, and reconnects after unplanned closes. UI layers
//! observe the connection through [`EventHandlers`] callbacks and the
//! [`ConnectionStatus`] flags; they never touch the socket directly.

pub mod connection;
pub mod error;
pub mod events;
pub mod protocol;
pub mod timings;

pub use connection::{ConnectionManager, ConnectionState, ConnectionStatus};
pub use error::TransportError;
pub use events::{DisconnectReason, EventHandlers};
pub use protocol::{CloseCode, ControlFrame, InboundFrame, OutboundFrame, TypingData};
pub use timings::TransportTimings;
