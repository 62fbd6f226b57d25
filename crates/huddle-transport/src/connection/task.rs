//! Background connection task
//!
//! Owns the socket and all three timers. Every state transition happens
//! inside this task's event loop, so no locking is needed; the public
//! handle only sends commands and reads the shared status flags.

use super::state::{ConnectionState, ConnectionStatus};
use crate::error::TransportError;
use crate::events::{DisconnectReason, EventHandlers};
use crate::protocol::{CloseCode, ControlFrame, InboundFrame, OutboundFrame};
use crate::timings::TransportTimings;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tokio_tungstenite::tungstenite::protocol::frame::coding;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Commands sent from the public handle to the connection task
#[derive(Debug)]
pub(crate) enum Command {
    Connect,
    Disconnect,
    Reconnect,
    SendMessage {
        recipient_ids: Vec<String>,
        content: String,
    },
    Typing {
        conversation_id: String,
    },
    StopTyping {
        conversation_id: String,
    },
    Shutdown,
}

/// What woke the event loop
enum Tick {
    Command(Option<Command>),
    Socket(Option<Result<Message, tungstenite::Error>>),
    AuthTimeout,
    HeartbeatDue,
    ReconnectDue,
}

/// A deadline far enough away to be effectively "never"
fn far_future() -> Instant {
    Instant::now() + Duration::from_secs(365 * 24 * 3600)
}

/// Read the next socket frame, or park forever while no socket exists
async fn next_frame(ws: &mut Option<WsStream>) -> Option<Result<Message, tungstenite::Error>> {
    match ws {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

/// The connection task state
pub(crate) struct ConnectionTask {
    url: String,
    credential: Option<String>,
    timings: TransportTimings,
    handlers: EventHandlers,
    status: Arc<ConnectionStatus>,
    cmd_rx: mpsc::Receiver<Command>,

    ws: Option<WsStream>,
    state: ConnectionState,
    /// False only between an explicit disconnect and the next connect
    should_reconnect: bool,
    auth_deadline: Option<Instant>,
    heartbeat_deadline: Option<Instant>,
    reconnect_deadline: Option<Instant>,
}

impl ConnectionTask {
    pub(crate) fn new(
        url: String,
        credential: Option<String>,
        timings: TransportTimings,
        handlers: EventHandlers,
        status: Arc<ConnectionStatus>,
        cmd_rx: mpsc::Receiver<Command>,
    ) -> Self {
        Self {
            url,
            credential,
            timings,
            handlers,
            status,
            cmd_rx,
            ws: None,
            state: ConnectionState::Idle,
            should_reconnect: true,
            auth_deadline: None,
            heartbeat_deadline: None,
            reconnect_deadline: None,
        }
    }

    /// Run the event loop until the handle is dropped or shut down
    pub(crate) async fn run(mut self) {
        loop {
            let auth_sleep = time::sleep_until(self.auth_deadline.unwrap_or_else(far_future));
            let heartbeat_sleep =
                time::sleep_until(self.heartbeat_deadline.unwrap_or_else(far_future));
            let reconnect_sleep =
                time::sleep_until(self.reconnect_deadline.unwrap_or_else(far_future));
            tokio::pin!(auth_sleep, heartbeat_sleep, reconnect_sleep);

            let tick = tokio::select! {
                biased;

                cmd = self.cmd_rx.recv() => Tick::Command(cmd),
                () = &mut auth_sleep, if self.auth_deadline.is_some() => Tick::AuthTimeout,
                () = &mut heartbeat_sleep, if self.heartbeat_deadline.is_some() => Tick::HeartbeatDue,
                () = &mut reconnect_sleep, if self.reconnect_deadline.is_some() => Tick::ReconnectDue,
                frame = next_frame(&mut self.ws) => Tick::Socket(frame),
            };

            match tick {
                Tick::Command(Some(cmd)) => {
                    if self.handle_command(cmd).await {
                        return;
                    }
                }
                Tick::Command(None) => {
                    // Handle dropped without an explicit shutdown
                    self.shutdown().await;
                    return;
                }
                Tick::Socket(event) => self.on_socket_event(event).await,
                Tick::AuthTimeout => self.on_auth_timeout().await,
                Tick::HeartbeatDue => self.on_heartbeat_due().await,
                Tick::ReconnectDue => {
                    self.reconnect_deadline = None;
                    self.open_socket().await;
                }
            }
        }
    }

    /// Handle a command; returns true when the task should exit
    async fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Connect => self.handle_connect().await,
            Command::Disconnect => self.handle_disconnect().await,
            Command::Reconnect => self.handle_reconnect().await,
            Command::SendMessage {
                recipient_ids,
                content,
            } => {
                if !(self.status.is_connected() && self.status.is_authenticated()) {
                    tracing::warn!("send_message rejected: not connected and authenticated");
                    return false;
                }
                self.send_frame(OutboundFrame::send_message(recipient_ids, content))
                    .await;
            }
            Command::Typing { conversation_id } => {
                if !self.status.is_authenticated() {
                    tracing::debug!("typing indicator dropped: not authenticated");
                    return false;
                }
                self.send_frame(OutboundFrame::typing(conversation_id)).await;
            }
            Command::StopTyping { conversation_id } => {
                if !self.status.is_authenticated() {
                    tracing::debug!("stop_typing indicator dropped: not authenticated");
                    return false;
                }
                self.send_frame(OutboundFrame::stop_typing(conversation_id))
                    .await;
            }
            Command::Shutdown => {
                self.shutdown().await;
                return true;
            }
        }
        false
    }

    fn has_credential(&self) -> bool {
        self.credential.as_deref().is_some_and(|t| !t.is_empty())
    }

    async fn handle_connect(&mut self) {
        if self.ws.is_some() {
            tracing::debug!(state = %self.state, "connect ignored: socket already open");
            return;
        }
        if !self.has_credential() {
            tracing::info!("connect ignored: no credential");
            return;
        }
        // A fresh connect supersedes any pending delayed retry
        self.reconnect_deadline = None;
        self.should_reconnect = true;
        self.open_socket().await;
    }

    async fn handle_disconnect(&mut self) {
        self.should_reconnect = false;
        self.clear_timers();
        if self.ws.is_some() {
            self.close_socket(CloseCode::Normal, "Client disconnect").await;
            self.handle_closed(DisconnectReason::with_code(
                "Client disconnect",
                CloseCode::Normal.as_u16(),
            ));
        } else {
            tracing::debug!("disconnect ignored: no open socket");
            self.state = ConnectionState::Idle;
        }
    }

    async fn handle_reconnect(&mut self) {
        self.should_reconnect = true;
        self.clear_timers();
        if self.ws.is_some() {
            // Close the old socket fully before dialing anew; the delayed
            // retry path is not used here
            self.close_socket(CloseCode::Normal, "Reconnecting").await;
            self.state = ConnectionState::Closed;
            self.status.reset();
            self.handlers.emit_disconnect(DisconnectReason::with_code(
                "Reconnecting",
                CloseCode::Normal.as_u16(),
            ));
        }
        self.open_socket().await;
    }

    /// Dial the gateway and start the auth handshake
    async fn open_socket(&mut self) {
        if self.ws.is_some() {
            return;
        }
        let Some(token) = self.credential.clone().filter(|t| !t.is_empty()) else {
            tracing::info!("connection attempt skipped: no credential");
            return;
        };

        self.state = ConnectionState::Connecting;
        tracing::debug!(url = %self.url, "opening gateway connection");

        match connect_async(&self.url).await {
            Ok((stream, _response)) => {
                self.ws = Some(stream);
                self.status.set_connected();
                self.handlers.emit_connect();
                tracing::info!("gateway connection established");

                // Arm the handshake timeout before the frame goes out so a
                // send failure cannot leave it dangling
                self.auth_deadline = Some(Instant::now() + self.timings.auth_timeout);
                self.send_frame(OutboundFrame::auth(token)).await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to reach gateway");
                self.handlers
                    .emit_error(TransportError::Socket(e.to_string()));
                self.handle_closed(DisconnectReason::new(format!("connect failed: {e}")));
            }
        }
    }

    /// Send the close frame and drop the socket
    async fn close_socket(&mut self, code: CloseCode, reason: &str) {
        if let Some(mut ws) = self.ws.take() {
            let frame = CloseFrame {
                code: coding::CloseCode::from(code.as_u16()),
                reason: reason.to_string().into(),
            };
            if let Err(e) = ws.close(Some(frame)).await {
                tracing::debug!(error = %e, "error while closing socket");
            }
        }
    }

    /// Common close path: clear timers, drop flags, notify, maybe schedule a retry
    ///
    /// Retries whenever a credential is present, including after an auth
    /// rejection; a permanently-invalid token therefore keeps retrying.
    fn handle_closed(&mut self, reason: DisconnectReason) {
        self.ws = None;
        self.clear_timers();
        self.state = ConnectionState::Closed;
        self.status.reset();

        tracing::info!(reason = %reason, "gateway connection closed");
        self.handlers.emit_disconnect(reason);

        if self.should_reconnect && self.has_credential() {
            self.reconnect_deadline = Some(Instant::now() + self.timings.reconnect_delay);
            tracing::debug!(
                delay_ms = self.timings.reconnect_delay.as_millis() as u64,
                "reconnect scheduled"
            );
        }
    }

    /// Disarm every timer; invoked on every transition away from a state
    /// that armed one
    fn clear_timers(&mut self) {
        self.auth_deadline = None;
        self.heartbeat_deadline = None;
        self.reconnect_deadline = None;
    }

    async fn on_auth_timeout(&mut self) {
        self.auth_deadline = None;
        if self.state != ConnectionState::Connecting {
            return;
        }
        tracing::warn!(
            timeout_ms = self.timings.auth_timeout.as_millis() as u64,
            "authentication timed out"
        );
        self.close_socket(CloseCode::AuthFailed, "Auth timeout").await;
        self.handle_closed(DisconnectReason::with_code(
            "Auth timeout",
            CloseCode::AuthFailed.as_u16(),
        ));
    }

    async fn on_heartbeat_due(&mut self) {
        self.heartbeat_deadline = Some(Instant::now() + self.timings.heartbeat_interval);
        self.send_frame(OutboundFrame::heartbeat()).await;
    }

    fn on_auth_success(&mut self) {
        if self.state != ConnectionState::Connecting {
            tracing::debug!(state = %self.state, "ignoring unexpected auth_success");
            return;
        }
        self.auth_deadline = None;
        self.state = ConnectionState::Authenticated;
        self.status.set_authenticated();
        self.heartbeat_deadline = Some(Instant::now() + self.timings.heartbeat_interval);
        tracing::info!("gateway authentication succeeded");
    }

    /// Serialize and send one frame; a send failure tears the connection down
    async fn send_frame(&mut self, frame: OutboundFrame) {
        let Some(ws) = self.ws.as_mut() else {
            tracing::warn!(frame = frame.name(), "dropping frame: no open socket");
            return;
        };
        let json = match frame.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(frame = frame.name(), error = %e, "failed to encode frame");
                return;
            }
        };
        tracing::trace!(frame = frame.name(), "sending frame");
        if let Err(e) = ws.send(Message::Text(json)).await {
            tracing::warn!(frame = frame.name(), error = %e, "failed to send frame");
            self.handlers
                .emit_error(TransportError::Socket(e.to_string()));
            self.handle_closed(DisconnectReason::new(format!("send failed: {e}")));
        }
    }

    async fn on_socket_event(&mut self, event: Option<Result<Message, tungstenite::Error>>) {
        match event {
            Some(Ok(Message::Text(text))) => self.on_text_frame(&text).await,
            Some(Ok(Message::Binary(_))) => {
                tracing::warn!("ignoring binary frame: not part of the protocol");
            }
            Some(Ok(Message::Ping(payload))) => {
                if let Some(ws) = self.ws.as_mut() {
                    let _ = ws.send(Message::Pong(payload)).await;
                }
            }
            Some(Ok(Message::Pong(_))) => {
                tracing::trace!("pong received");
            }
            Some(Ok(Message::Close(frame))) => {
                let reason = match frame {
                    Some(f) => DisconnectReason::with_code(f.reason.to_string(), u16::from(f.code)),
                    None => DisconnectReason::new("Server closed connection"),
                };
                self.handle_closed(reason);
            }
            Some(Ok(Message::Frame(_))) => {}
            Some(Err(e)) => {
                tracing::warn!(error = %e, "socket error");
                self.handlers
                    .emit_error(TransportError::Socket(e.to_string()));
                self.handle_closed(DisconnectReason::new(format!("socket error: {e}")));
            }
            None => {
                self.handle_closed(DisconnectReason::new("Stream ended"));
            }
        }
    }

    async fn on_text_frame(&mut self, text: &str) {
        let frame = match InboundFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed frame");
                return;
            }
        };

        match frame {
            InboundFrame::Control(ControlFrame::AuthSuccess) => self.on_auth_success(),
            InboundFrame::Control(ControlFrame::AuthError) => {
                // Logged only; callers infer persistent auth failure from
                // repeated disconnects
                tracing::warn!("gateway rejected credential");
                self.close_socket(CloseCode::AuthFailed, "Unauthorized").await;
                self.handle_closed(DisconnectReason::with_code(
                    "Unauthorized",
                    CloseCode::AuthFailed.as_u16(),
                ));
            }
            InboundFrame::Control(ControlFrame::HeartbeatAck) => {
                tracing::trace!("heartbeat acknowledged");
            }
            InboundFrame::Control(ControlFrame::Error { error }) => {
                tracing::warn!(error = %error, "gateway reported error");
                self.handlers.emit_error(TransportError::Gateway(error));
            }
            InboundFrame::Event(value) => {
                tracing::trace!(
                    frame_type = value.get("type").and_then(serde_json::Value::as_str).unwrap_or("unknown"),
                    "forwarding event to caller"
                );
                self.handlers.emit_message(value);
            }
        }
    }

    /// Final teardown; no callbacks fire, the handle is already gone
    async fn shutdown(&mut self) {
        self.should_reconnect = false;
        self.clear_timers();
        if self.ws.is_some() {
            self.close_socket(CloseCode::Normal, "Client shutdown").await;
        }
        self.status.reset();
        self.state = ConnectionState::Closed;
        tracing::debug!("connection task stopped");
    }
}
