//! Caller-supplied lifecycle callbacks
//!
//! Callbacks are invoked from the connection task and must not block. All of
//! them are optional; an unset callback is simply skipped.

use crate::error::TransportError;
use serde_json::Value;
use std::sync::Arc;

type ConnectFn = Arc<dyn Fn() + Send + Sync>;
type DisconnectFn = Arc<dyn Fn(DisconnectReason) + Send + Sync>;
type MessageFn = Arc<dyn Fn(Value) + Send + Sync>;
type ErrorFn = Arc<dyn Fn(TransportError) + Send + Sync>;

/// Why a connection closed
#[derive(Debug, Clone)]
pub struct DisconnectReason {
    /// Human-readable description
    pub message: String,
    /// WebSocket close code, when one was observed
    pub code: Option<u16>,
}

impl DisconnectReason {
    /// Create a reason without a close code
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    /// Create a reason with a close code
    #[must_use]
    pub fn with_code(message: impl Into<String>, code: u16) -> Self {
        Self {
            message: message.into(),
            code: Some(code),
        }
    }
}

impl std::fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (code {})", self.message, code),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Lifecycle callback set, built with the `on_*` methods
#[derive(Clone, Default)]
pub struct EventHandlers {
    on_connect: Option<ConnectFn>,
    on_disconnect: Option<DisconnectFn>,
    on_message: Option<MessageFn>,
    on_error: Option<ErrorFn>,
}

impl EventHandlers {
    /// Create an empty callback set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoked when the socket opens, before authentication completes
    #[must_use]
    pub fn on_connect(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_connect = Some(Arc::new(f));
        self
    }

    /// Invoked after every close, planned or not
    #[must_use]
    pub fn on_disconnect(mut self, f: impl Fn(DisconnectReason) + Send + Sync + 'static) -> Self {
        self.on_disconnect = Some(Arc::new(f));
        self
    }

    /// Invoked with every non-control frame, passed through verbatim
    #[must_use]
    pub fn on_message(mut self, f: impl Fn(Value) + Send + Sync + 'static) -> Self {
        self.on_message = Some(Arc::new(f));
        self
    }

    /// Invoked on socket errors and gateway `error` frames
    #[must_use]
    pub fn on_error(mut self, f: impl Fn(TransportError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub(crate) fn emit_connect(&self) {
        if let Some(f) = &self.on_connect {
            f();
        }
    }

    pub(crate) fn emit_disconnect(&self, reason: DisconnectReason) {
        if let Some(f) = &self.on_disconnect {
            f(reason);
        }
    }

    pub(crate) fn emit_message(&self, frame: Value) {
        if let Some(f) = &self.on_message {
            f(frame);
        }
    }

    pub(crate) fn emit_error(&self, error: TransportError) {
        if let Some(f) = &self.on_error {
            f(error);
        }
    }
}

impl std::fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHandlers")
            .field("on_connect", &self.on_connect.is_some())
            .field("on_disconnect", &self.on_disconnect.is_some())
            .field("on_message", &self.on_message.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
