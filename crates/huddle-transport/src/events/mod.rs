//! Lifecycle callbacks
//!
//! The caller observes the connection through this surface; the transport
//! never exposes the raw socket.

mod handlers;

pub use handlers::{DisconnectReason, EventHandlers};
