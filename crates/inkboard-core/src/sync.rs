//! Real-time channel protocol and WebSocket transport.
//!
//! Messages are JSON objects of the form `{"event": <name>, "data": <payload>}`.
//! Every payload carries the full element collection; there is no diffing.

use crate::elements::DrawingElement;
use crate::error::NetworkError;
use serde::{Deserialize, Serialize};

/// Messages sent to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Join a canvas's session.
    JoinCanvas {
        #[serde(rename = "canvasId")]
        canvas_id: String,
        token: String,
    },
    /// Full snapshot after a local edit.
    DrawingUpdate {
        #[serde(rename = "canvasId")]
        canvas_id: String,
        elements: Vec<DrawingElement>,
    },
}

/// Payload of an authorization denial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Denial {
    pub message: String,
}

/// Messages received from the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Initial snapshot for the joined canvas.
    LoadCanvas(Vec<DrawingElement>),
    /// Snapshot committed by another participant.
    ReceiveDrawingUpdate(Vec<DrawingElement>),
    /// Edit rights for the canvas were denied.
    Unauthorized(Denial),
}

impl ClientMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Raw events produced by a transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected,
    Disconnected,
    /// A text frame from the server.
    Message(String),
    Error { message: String },
}

/// Events surfaced by the sync client after inbound traffic is admitted.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// Connected to server
    Connected,
    /// Disconnected from server
    Disconnected,
    /// The initial snapshot was admitted.
    CanvasLoaded { element_count: usize },
    /// A participant's snapshot was admitted.
    UpdateReceived { element_count: usize },
    /// Edit rights were revoked; the board is now read-only.
    Unauthorized { message: String },
    /// Error occurred
    Error { message: String },
}

/// A bidirectional text channel to the relay server.
///
/// Implementations never reconnect on their own.
pub trait Transport {
    /// Open the channel. Events arrive through [`poll_events`](Self::poll_events).
    fn connect(&mut self, url: &str) -> Result<(), NetworkError>;

    /// Close the channel and drop any undelivered events.
    fn disconnect(&mut self);

    /// Queue a text frame for sending.
    fn send(&mut self, msg: &str) -> Result<(), NetworkError>;

    /// Drain pending events (non-blocking).
    fn poll_events(&mut self) -> Vec<TransportEvent>;

    fn state(&self) -> ConnectionState;

    fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }
}

// ============================================================================
// In-memory transport
// ============================================================================

/// Transport that records outbound frames and replays queued inbound ones.
///
/// Used for headless sessions and tests.
#[derive(Debug)]
pub struct MemoryTransport {
    state: ConnectionState,
    url: Option<String>,
    sent: Vec<String>,
    inbox: Vec<TransportEvent>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            url: None,
            sent: Vec::new(),
            inbox: Vec::new(),
        }
    }

    /// Queue an inbound server message.
    pub fn push_inbound(&mut self, msg: &ServerMessage) {
        match msg.to_json() {
            Ok(json) => self.inbox.push(TransportEvent::Message(json)),
            Err(e) => log::error!("Failed to encode inbound message: {}", e),
        }
    }

    /// Queue a raw inbound event.
    pub fn push_event(&mut self, event: TransportEvent) {
        self.inbox.push(event);
    }

    /// Take every frame sent so far.
    pub fn take_sent(&mut self) -> Vec<String> {
        std::mem::take(&mut self.sent)
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MemoryTransport {
    fn connect(&mut self, url: &str) -> Result<(), NetworkError> {
        self.url = Some(url.to_string());
        self.state = ConnectionState::Connected;
        self.inbox.push(TransportEvent::Connected);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.inbox.clear();
    }

    fn send(&mut self, msg: &str) -> Result<(), NetworkError> {
        if self.state != ConnectionState::Connected {
            return Err(NetworkError::Channel("Not connected".to_string()));
        }
        self.sent.push(msg.to_string());
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<TransportEvent> {
        std::mem::take(&mut self.inbox)
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}

// ============================================================================
// Native WebSocket Client
// ============================================================================

mod native_client {
    use super::*;
    use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
    use std::thread::{self, JoinHandle};
    use std::time::Duration;
    use tungstenite::{Message, connect};
    use url::Url;

    /// First 100 characters of a frame, cut on a char boundary.
    pub(super) fn preview(frame: &str) -> &str {
        frame
            .char_indices()
            .nth(100)
            .map_or(frame, |(i, _)| &frame[..i])
    }

    /// Commands sent to the WebSocket thread.
    enum WsCommand {
        Send(String),
        Close,
    }

    /// WebSocket client for native platforms.
    ///
    /// Uses a background thread for non-blocking operation.
    pub struct NativeWebSocket {
        state: ConnectionState,
        /// Channel to send commands to the WebSocket thread.
        cmd_tx: Option<Sender<WsCommand>>,
        /// Channel to receive events from the WebSocket thread.
        event_rx: Option<Receiver<TransportEvent>>,
        /// Handle to the WebSocket thread.
        _thread: Option<JoinHandle<()>>,
    }

    impl NativeWebSocket {
        /// Create a new disconnected WebSocket client.
        pub fn new() -> Self {
            Self {
                state: ConnectionState::Disconnected,
                cmd_tx: None,
                event_rx: None,
                _thread: None,
            }
        }
    }

    impl Transport for NativeWebSocket {
        fn connect(&mut self, url: &str) -> Result<(), NetworkError> {
            if self.cmd_tx.is_some() {
                return Err(NetworkError::Channel("Already connected".to_string()));
            }

            let parsed_url =
                Url::parse(url).map_err(|e| NetworkError::Channel(format!("Invalid URL: {}", e)))?;
            if parsed_url.scheme() != "ws" && parsed_url.scheme() != "wss" {
                return Err(NetworkError::Channel(format!(
                    "Invalid WebSocket URL scheme: {}",
                    parsed_url.scheme()
                )));
            }

            self.state = ConnectionState::Connecting;

            let (cmd_tx, cmd_rx) = channel::<WsCommand>();
            let (event_tx, event_rx) = channel::<TransportEvent>();

            let url = url.to_string();

            let handle = thread::spawn(move || {
                log::info!("WebSocket thread: connecting to {}", url);

                match connect(url.as_str()) {
                    Ok((mut socket, response)) => {
                        log::info!("WebSocket connected, status: {}", response.status());
                        let _ = event_tx.send(TransportEvent::Connected);

                        // Short read timeout keeps the command loop responsive
                        match socket.get_mut() {
                            tungstenite::stream::MaybeTlsStream::Plain(tcp) => {
                                let _ = tcp.set_read_timeout(Some(Duration::from_millis(50)));
                                let _ = tcp.set_write_timeout(Some(Duration::from_secs(5)));
                            }
                            #[allow(unreachable_patterns)]
                            _ => {
                                log::debug!("TLS or other stream - using default timeout handling");
                            }
                        }

                        loop {
                            match cmd_rx.try_recv() {
                                Ok(WsCommand::Send(msg)) => {
                                    log::debug!("WebSocket sending: {}", preview(&msg));
                                    if let Err(e) = socket.send(Message::Text(msg)) {
                                        log::error!("WebSocket send error: {}", e);
                                        let _ = event_tx.send(TransportEvent::Error {
                                            message: format!("Send failed: {}", e),
                                        });
                                        break;
                                    }
                                }
                                Ok(WsCommand::Close) => {
                                    log::info!("WebSocket close requested");
                                    let _ = socket.close(None);
                                    break;
                                }
                                Err(TryRecvError::Disconnected) => {
                                    log::info!("WebSocket command channel disconnected");
                                    break;
                                }
                                Err(TryRecvError::Empty) => {}
                            }

                            match socket.read() {
                                Ok(Message::Text(txt)) => {
                                    log::debug!("WebSocket received: {}", preview(&txt));
                                    if event_tx.send(TransportEvent::Message(txt)).is_err() {
                                        // receiver dropped: the session detached
                                        break;
                                    }
                                }
                                Ok(Message::Ping(data)) => {
                                    let _ = socket.send(Message::Pong(data));
                                }
                                Ok(Message::Close(_)) => {
                                    log::info!("WebSocket received close frame");
                                    break;
                                }
                                Ok(_) => {}
                                Err(tungstenite::Error::Io(ref e))
                                    if e.kind() == std::io::ErrorKind::WouldBlock
                                        || e.kind() == std::io::ErrorKind::TimedOut =>
                                {
                                    continue;
                                }
                                Err(e) => {
                                    log::error!("WebSocket read error: {}", e);
                                    let _ = event_tx.send(TransportEvent::Error {
                                        message: format!("Read failed: {}", e),
                                    });
                                    break;
                                }
                            }
                        }

                        log::info!("WebSocket thread exiting");
                        let _ = event_tx.send(TransportEvent::Disconnected);
                    }
                    Err(e) => {
                        log::error!("WebSocket connection failed: {}", e);
                        let _ = event_tx.send(TransportEvent::Error {
                            message: format!("Connection failed: {}", e),
                        });
                    }
                }
            });

            self.cmd_tx = Some(cmd_tx);
            self.event_rx = Some(event_rx);
            self._thread = Some(handle);

            Ok(())
        }

        fn disconnect(&mut self) {
            if let Some(tx) = self.cmd_tx.take() {
                let _ = tx.send(WsCommand::Close);
            }
            // Dropping the receiver discards anything the old session still had in flight.
            self.event_rx = None;
            self._thread = None;
            self.state = ConnectionState::Disconnected;
        }

        fn send(&mut self, msg: &str) -> Result<(), NetworkError> {
            match self.cmd_tx {
                Some(ref tx) => tx
                    .send(WsCommand::Send(msg.to_string()))
                    .map_err(|e| NetworkError::Channel(format!("Send failed: {}", e))),
                None => Err(NetworkError::Channel("Not connected".to_string())),
            }
        }

        fn poll_events(&mut self) -> Vec<TransportEvent> {
            let mut events = Vec::new();
            if let Some(ref rx) = self.event_rx {
                while let Ok(event) = rx.try_recv() {
                    match &event {
                        TransportEvent::Connected => self.state = ConnectionState::Connected,
                        TransportEvent::Disconnected => self.state = ConnectionState::Disconnected,
                        TransportEvent::Error { .. } => self.state = ConnectionState::Error,
                        TransportEvent::Message(_) => {}
                    }
                    events.push(event);
                }
            }
            events
        }

        fn state(&self) -> ConnectionState {
            self.state
        }
    }

    impl Default for NativeWebSocket {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Drop for NativeWebSocket {
        fn drop(&mut self) {
            self.disconnect();
        }
    }
}

pub use native_client::NativeWebSocket;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ElementKind, Geometry, Style};
    use std::net::TcpListener;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_join_canvas_wire_shape() {
        let msg = ClientMessage::JoinCanvas {
            canvas_id: "abc".to_string(),
            token: "t0k".to_string(),
        };
        let json: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(json["event"], "joinCanvas");
        assert_eq!(json["data"]["canvasId"], "abc");
        assert_eq!(json["data"]["token"], "t0k");
    }

    #[test]
    fn test_drawing_update_wire_shape() {
        let el = DrawingElement::anchored(0, ElementKind::Line, 1.0, 2.0, Style::default());
        let msg = ClientMessage::DrawingUpdate {
            canvas_id: "abc".to_string(),
            elements: vec![el],
        };
        let json: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(json["event"], "drawingUpdate");
        assert_eq!(json["data"]["elements"][0]["type"], "LINE");
    }

    #[test]
    fn test_server_message_deserialize() {
        let json = r#"{"event":"unauthorized","data":{"message":"read only"}}"#;
        let msg: ServerMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            ServerMessage::Unauthorized(Denial {
                message: "read only".to_string()
            })
        );

        let json = r#"{"event":"loadCanvas","data":[]}"#;
        let msg: ServerMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg, ServerMessage::LoadCanvas(Vec::new()));
    }

    #[test]
    fn test_memory_transport_drops_inbox_on_disconnect() {
        let mut transport = MemoryTransport::new();
        transport.connect("ws://localhost/ws").unwrap();
        transport.push_inbound(&ServerMessage::LoadCanvas(Vec::new()));
        transport.disconnect();
        assert!(transport.poll_events().is_empty());
        assert!(transport.send("x").is_err());
    }

    #[test]
    fn test_preview_cuts_on_char_boundary() {
        let frame = format!("a{}", "é".repeat(120));
        let cut = native_client::preview(&frame);
        assert_eq!(cut.chars().count(), 100);
        assert!(frame.starts_with(cut));
        assert_eq!(native_client::preview("short"), "short");
    }

    #[test]
    fn test_native_delivers_non_ascii_frames() {
        log::set_max_level(log::LevelFilter::Debug);

        let snapshot_with = |content: String| {
            let text = DrawingElement::new(
                0,
                Geometry::anchored(ElementKind::Text, 5.0, 5.0),
                Style::default(),
            )
            .with_text(content);
            ServerMessage::LoadCanvas(vec![text])
        };
        let mut snapshot = snapshot_with("é".repeat(80));
        if snapshot.to_json().unwrap().is_char_boundary(100) {
            snapshot = snapshot_with(format!("x{}", "é".repeat(80)));
        }
        let frame = snapshot.to_json().unwrap();
        assert!(!frame.is_char_boundary(100));

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut socket = tungstenite::accept(stream).unwrap();
            socket.send(tungstenite::Message::Text(frame)).unwrap();
            while socket.read().is_ok() {}
        });

        let mut ws = NativeWebSocket::new();
        ws.connect(&format!("ws://{addr}/ws")).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut events = Vec::new();
        while Instant::now() < deadline {
            events.extend(ws.poll_events());
            if events.iter().any(|e| matches!(e, TransportEvent::Message(_))) {
                break;
            }
            thread::sleep(Duration::from_millis(20));
        }

        assert_eq!(events[0], TransportEvent::Connected);
        let received = events.iter().find_map(|e| match e {
            TransportEvent::Message(txt) => {
                Some(serde_json::from_str::<ServerMessage>(txt).unwrap())
            }
            _ => None,
        });
        assert_eq!(received, Some(snapshot));
        assert_eq!(ws.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_native_rejects_non_websocket_url() {
        let mut ws = NativeWebSocket::new();
        assert!(ws.connect("http://localhost:3030").is_err());
        assert_eq!(ws.state(), ConnectionState::Disconnected);
    }
}
