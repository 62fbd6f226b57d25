//! Transport timing configuration
//!
//! All three timers of the connection lifecycle in one place, so tests can
//! shorten them without touching the production defaults.

use std::time::Duration;

/// Timer durations used by the connection manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportTimings {
    /// How long to wait for `auth_success` after sending the auth frame
    pub auth_timeout: Duration,
    /// Interval between heartbeat frames while authenticated
    pub heartbeat_interval: Duration,
    /// Delay before reconnecting after an unplanned close
    pub reconnect_delay: Duration,
}

impl TransportTimings {
    /// Default auth handshake timeout (5 seconds)
    pub const DEFAULT_AUTH_TIMEOUT_MS: u64 = 5_000;

    /// Default heartbeat interval (30 seconds)
    pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 30_000;

    /// Default reconnect delay (3 seconds)
    pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 3_000;

    /// Create timings from millisecond values
    #[must_use]
    pub const fn from_millis(auth_timeout: u64, heartbeat_interval: u64, reconnect_delay: u64) -> Self {
        Self {
            auth_timeout: Duration::from_millis(auth_timeout),
            heartbeat_interval: Duration::from_millis(heartbeat_interval),
            reconnect_delay: Duration::from_millis(reconnect_delay),
        }
    }
}

impl Default for TransportTimings {
    fn default() -> Self {
        Self::from_millis(
            Self::DEFAULT_AUTH_TIMEOUT_MS,
            Self::DEFAULT_HEARTBEAT_INTERVAL_MS,
            Self::DEFAULT_RECONNECT_DELAY_MS,
        )
    }
}
