//! Transport error types
//!
//! Errors are reported through the `on_error` callback; no public operation
//! returns them or panics.

/// Errors surfaced to the caller through `on_error`
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// Socket-level failure (dial, read, or write). Not fatal by itself;
    /// the close path that follows decides whether to reconnect.
    #[error("socket error: {0}")]
    Socket(String),

    /// An `error` frame sent by the gateway.
    #[error("gateway error: {0}")]
    Gateway(String),
}
