//! Connection manager
//!
//! Public handle over the background connection task. Owns the task for its
//! whole lifetime; dropping the manager tears the connection down.

use super::state::ConnectionStatus;
use super::task::{Command, ConnectionTask};
use crate::events::EventHandlers;
use crate::timings::TransportTimings;
use huddle_common::GatewayConfig;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Capacity of the command channel between handle and task
const COMMAND_BUFFER_SIZE: usize = 64;

/// Manages one WebSocket connection to the chat gateway
///
/// At most one socket is live at a time. All operations are fire-and-forget:
/// none of them return errors or panic; rejected sends are logged and
/// failures surface through the [`EventHandlers`] callbacks. Share one
/// manager (via `Arc`) across UI consumers instead of opening one socket
/// each.
pub struct ConnectionManager {
    cmd_tx: mpsc::Sender<Command>,
    status: Arc<ConnectionStatus>,
    _task: JoinHandle<()>,
}

impl ConnectionManager {
    /// Create a manager with default production timings
    ///
    /// The credential is the opaque bearer token for the gateway handshake;
    /// without one, `connect()` is a no-op.
    #[must_use]
    pub fn new(
        gateway: GatewayConfig,
        credential: Option<String>,
        handlers: EventHandlers,
    ) -> Self {
        Self::with_timings(gateway, credential, TransportTimings::default(), handlers)
    }

    /// Create a manager with custom timings
    #[must_use]
    pub fn with_timings(
        gateway: GatewayConfig,
        credential: Option<String>,
        timings: TransportTimings,
        handlers: EventHandlers,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER_SIZE);
        let status = ConnectionStatus::new();

        let task = ConnectionTask::new(
            gateway.url,
            credential,
            timings,
            handlers,
            status.clone(),
            cmd_rx,
        );
        let handle = tokio::spawn(task.run());

        Self {
            cmd_tx,
            status,
            _task: handle,
        }
    }

    /// Open the connection and start the auth handshake
    ///
    /// No-op (logged) if the credential is missing or a socket is already
    /// open or opening.
    pub async fn connect(&self) {
        self.send_command(Command::Connect).await;
    }

    /// Close the connection and suppress auto-reconnect
    ///
    /// Idempotent. A later `connect()` re-enables reconnection.
    pub async fn disconnect(&self) {
        self.send_command(Command::Disconnect).await;
    }

    /// Force a fresh connection immediately, bypassing the reconnect delay
    ///
    /// Any existing socket is closed first; idempotent when disconnected.
    pub async fn reconnect(&self) {
        self.send_command(Command::Reconnect).await;
    }

    /// Send a chat message to one or more recipients
    ///
    /// Rejected (logged, nothing sent) unless connected and authenticated,
    /// or when the recipient list is empty. Delivery is best-effort; no
    /// acknowledgement is awaited.
    pub async fn send_message(&self, recipient_ids: Vec<String>, content: impl Into<String>) {
        if recipient_ids.is_empty() {
            tracing::warn!("send_message rejected: empty recipient list");
            return;
        }
        if !(self.is_connected() && self.is_authenticated()) {
            tracing::warn!("send_message rejected: not connected and authenticated");
            return;
        }
        self.send_command(Command::SendMessage {
            recipient_ids,
            content: content.into(),
        })
        .await;
    }

    /// Send a typing indicator for a conversation
    ///
    /// Silently dropped while unauthenticated.
    pub async fn send_typing(&self, conversation_id: impl Into<String>) {
        if !self.is_authenticated() {
            tracing::debug!("typing indicator dropped: not authenticated");
            return;
        }
        self.send_command(Command::Typing {
            conversation_id: conversation_id.into(),
        })
        .await;
    }

    /// Stop the typing indicator for a conversation
    ///
    /// Silently dropped while unauthenticated.
    pub async fn send_stop_typing(&self, conversation_id: impl Into<String>) {
        if !self.is_authenticated() {
            tracing::debug!("stop_typing indicator dropped: not authenticated");
            return;
        }
        self.send_command(Command::StopTyping {
            conversation_id: conversation_id.into(),
        })
        .await;
    }

    /// Whether a socket is currently open
    pub fn is_connected(&self) -> bool {
        self.status.is_connected()
    }

    /// Whether the handshake has been accepted on the current socket
    pub fn is_authenticated(&self) -> bool {
        self.status.is_authenticated()
    }

    /// Shared status flags, for callers that poll
    #[must_use]
    pub fn status(&self) -> Arc<ConnectionStatus> {
        self.status.clone()
    }

    async fn send_command(&self, cmd: Command) {
        if self.cmd_tx.send(cmd).await.is_err() {
            tracing::warn!("connection task is not running");
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        // Best-effort shutdown; also covered by the task seeing the channel close
        let _ = self.cmd_tx.try_send(Command::Shutdown);
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connected", &self.is_connected())
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
