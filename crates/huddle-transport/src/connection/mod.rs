//! Connection management
//!
//! One [`ConnectionManager`] owns one socket, its handshake, heartbeat, and
//! reconnection policy. The socket itself lives in a background task; the
//! manager is a thin command handle over it.

mod manager;
mod state;
mod task;

pub use manager::ConnectionManager;
pub use state::{ConnectionState, ConnectionStatus};
