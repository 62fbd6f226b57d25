//! Connection state and observable status flags

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Lifecycle state of the managed connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket, nothing scheduled
    Idle,
    /// Socket open, auth frame sent, waiting for `auth_success`
    Connecting,
    /// Handshake accepted, heartbeat running
    Authenticated,
    /// Socket closed (cleanly or not); a reconnect may be pending
    Closed,
}

impl ConnectionState {
    /// Whether a socket exists in this state
    #[must_use]
    pub const fn has_socket(self) -> bool {
        matches!(self, Self::Connecting | Self::Authenticated)
    }

    /// Get the name of this state
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Connecting => "Connecting",
            Self::Authenticated => "Authenticated",
            Self::Closed => "Closed",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Connection flags published by the connection task and read by callers
///
/// `authenticated` is only ever true while `connected` is true; any close
/// clears both before reconnection logic runs.
#[derive(Debug, Default)]
pub struct ConnectionStatus {
    connected: AtomicBool,
    authenticated: AtomicBool,
}

impl ConnectionStatus {
    /// Create a fresh status, both flags false
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Whether a socket is currently open
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Whether the handshake has been accepted on the current socket
    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    /// Mark the socket open (not yet authenticated)
    pub(crate) fn set_connected(&self) {
        self.connected.store(true, Ordering::SeqCst);
    }

    /// Mark the handshake accepted
    pub(crate) fn set_authenticated(&self) {
        self.authenticated.store(true, Ordering::SeqCst);
    }

    /// Clear both flags; called on every close before anything else runs
    pub(crate) fn reset(&self) {
        self.authenticated.store(false, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
    }
}
