//! Test helpers for transport integration tests
//!
//! Provides a scripted in-process WebSocket gateway: tests accept the
//! client's connections, inspect the frames it sends, and answer with
//! whatever control frames or closes the scenario calls for.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use huddle_common::GatewayConfig;
use huddle_transport::{DisconnectReason, EventHandlers, TransportError, TransportTimings};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::frame::coding;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

/// How long event waits may take before the test fails
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Shortened timings so reconnect/heartbeat scenarios run in milliseconds
#[must_use]
pub fn fast_timings() -> TransportTimings {
    TransportTimings::from_millis(150, 100, 120)
}

/// Something the client did, as observed by the gateway
#[derive(Debug)]
pub enum ClientEvent {
    /// A text frame, parsed as JSON
    Frame(Value),
    /// A close frame
    Closed { code: Option<u16>, reason: String },
    /// The TCP stream ended without a close handshake
    Dropped,
}

enum ServerAction {
    Send(String),
    Close(u16, String),
    Drop,
}

/// One accepted client connection, driven by the test
pub struct GatewayConn {
    events: mpsc::Receiver<ClientEvent>,
    actions: mpsc::Sender<ServerAction>,
    _task: JoinHandle<()>,
}

impl GatewayConn {
    fn spawn(mut ws: WebSocketStream<TcpStream>) -> Self {
        let (event_tx, events) = mpsc::channel(64);
        let (actions, mut action_rx) = mpsc::channel::<ServerAction>(16);

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    action = action_rx.recv() => match action {
                        Some(ServerAction::Send(text)) => {
                            if ws.send(Message::Text(text)).await.is_err() {
                                break;
                            }
                        }
                        Some(ServerAction::Close(code, reason)) => {
                            let frame = CloseFrame {
                                code: coding::CloseCode::from(code),
                                reason: reason.into(),
                            };
                            let _ = ws.close(Some(frame)).await;
                            // keep draining so the client's close reply is observed
                        }
                        Some(ServerAction::Drop) | None => break,
                    },
                    msg = ws.next() => match msg {
                        Some(Ok(Message::Text(text))) => {
                            let value = serde_json::from_str(&text)
                                .expect("client sent invalid JSON");
                            if event_tx.send(ClientEvent::Frame(value)).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let event = match frame {
                                Some(f) => ClientEvent::Closed {
                                    code: Some(u16::from(f.code)),
                                    reason: f.reason.to_string(),
                                },
                                None => ClientEvent::Closed {
                                    code: None,
                                    reason: String::new(),
                                },
                            };
                            let _ = event_tx.send(event).await;
                        }
                        Some(Ok(_)) => {} // ping/pong
                        Some(Err(_)) | None => {
                            let _ = event_tx.send(ClientEvent::Dropped).await;
                            break;
                        }
                    }
                }
            }
        });

        Self {
            events,
            actions,
            _task: task,
        }
    }

    /// Wait for the next client event
    pub async fn next_event(&mut self) -> ClientEvent {
        timeout(WAIT_TIMEOUT, self.events.recv())
            .await
            .expect("timed out waiting for client event")
            .expect("gateway connection task ended")
    }

    /// Wait for the next event and require it to be a frame
    pub async fn expect_frame(&mut self) -> Value {
        match self.next_event().await {
            ClientEvent::Frame(value) => value,
            other => panic!("expected frame, got {other:?}"),
        }
    }

    /// Wait for the next event and require it to be a close
    pub async fn expect_close(&mut self) -> (Option<u16>, String) {
        match self.next_event().await {
            ClientEvent::Closed { code, reason } => (code, reason),
            other => panic!("expected close, got {other:?}"),
        }
    }

    /// Assert the client sends nothing for the given window
    pub async fn assert_silent(&mut self, window: Duration) {
        if let Ok(Some(event)) = timeout(window, self.events.recv()).await {
            panic!("expected silence, got {event:?}");
        }
    }

    /// Consume the client's auth frame and accept it
    ///
    /// Returns the auth frame for further assertions.
    pub async fn authorize(&mut self) -> Value {
        let frame = self.expect_frame().await;
        assert_eq!(frame["type"], "auth", "expected auth frame, got {frame}");
        self.send(json!({"type": "auth_success"})).await;
        frame
    }

    /// Send a JSON frame to the client
    pub async fn send(&self, value: Value) {
        self.actions
            .send(ServerAction::Send(value.to_string()))
            .await
            .expect("gateway connection task ended");
    }

    /// Send a raw text frame (for malformed-input scenarios)
    pub async fn send_raw(&self, text: impl Into<String>) {
        self.actions
            .send(ServerAction::Send(text.into()))
            .await
            .expect("gateway connection task ended");
    }

    /// Close the connection with a code and reason
    pub async fn close(&self, code: u16, reason: &str) {
        self.actions
            .send(ServerAction::Close(code, reason.to_string()))
            .await
            .expect("gateway connection task ended");
    }

    /// Drop the TCP stream without a close handshake
    pub async fn drop_connection(&self) {
        self.actions
            .send(ServerAction::Drop)
            .await
            .expect("gateway connection task ended");
    }
}

/// Scripted in-process gateway server
pub struct MockGateway {
    addr: SocketAddr,
    conns: mpsc::Receiver<GatewayConn>,
    _accept_task: JoinHandle<()>,
}

impl MockGateway {
    /// Bind a listener on an ephemeral port and start accepting
    pub async fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (conn_tx, conns) = mpsc::channel(8);

        let accept_task = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
                    continue;
                };
                if conn_tx.send(GatewayConn::spawn(ws)).await.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            addr,
            conns,
            _accept_task: accept_task,
        })
    }

    /// WebSocket URL of this gateway
    #[must_use]
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Gateway configuration pointing at this server
    #[must_use]
    pub fn config(&self) -> GatewayConfig {
        GatewayConfig::new(self.url())
    }

    /// Wait for the client's next connection
    pub async fn next_conn(&mut self) -> GatewayConn {
        timeout(WAIT_TIMEOUT, self.conns.recv())
            .await
            .expect("timed out waiting for a gateway connection")
            .expect("gateway accept task ended")
    }

    /// Assert no new connection arrives within the given window
    pub async fn assert_no_conn(&mut self, window: Duration) {
        if let Ok(Some(_)) = timeout(window, self.conns.recv()).await {
            panic!("unexpected new gateway connection");
        }
    }
}

/// Captured callback invocations, one receiver per callback
pub struct CapturedEvents {
    pub connects: mpsc::UnboundedReceiver<()>,
    pub disconnects: mpsc::UnboundedReceiver<DisconnectReason>,
    pub messages: mpsc::UnboundedReceiver<Value>,
    pub errors: mpsc::UnboundedReceiver<TransportError>,
}

/// Build an [`EventHandlers`] set that records every invocation
#[must_use]
pub fn capturing_handlers() -> (EventHandlers, CapturedEvents) {
    let (connect_tx, connects) = mpsc::unbounded_channel();
    let (disconnect_tx, disconnects) = mpsc::unbounded_channel();
    let (message_tx, messages) = mpsc::unbounded_channel();
    let (error_tx, errors) = mpsc::unbounded_channel();

    let handlers = EventHandlers::new()
        .on_connect(move || {
            let _ = connect_tx.send(());
        })
        .on_disconnect(move |reason| {
            let _ = disconnect_tx.send(reason);
        })
        .on_message(move |frame| {
            let _ = message_tx.send(frame);
        })
        .on_error(move |error| {
            let _ = error_tx.send(error);
        });

    (
        handlers,
        CapturedEvents {
            connects,
            disconnects,
            messages,
            errors,
        },
    )
}

/// Poll a condition until it holds or a short deadline passes
pub async fn wait_for(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !cond() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
