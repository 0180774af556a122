//! Synchronization client.
//!
//! `SyncClient` ties one [`BoardState`] to one [`Transport`]. It translates
//! user input into board actions, forwards full snapshots after local edits,
//! and admits snapshots from the server. Inbound traffic and local input are
//! both processed on the caller's thread, one at a time.

use crate::api::ApiClient;
use crate::board::{Action, BoardState};
use crate::config::ClientConfig;
use crate::credentials::TokenStore;
use crate::elements::DrawingElement;
use crate::error::{AuthError, ClientError, ClientResult};
use crate::input::{InputEvent, Shortcut};
use crate::sync::{
    ClientMessage, ConnectionState, NativeWebSocket, ServerMessage, SyncEvent, Transport,
    TransportEvent,
};
use crate::tools::{ActionType, ToolKind};
use std::sync::Arc;
use uuid::Uuid;

/// Sync client over the native WebSocket transport.
pub type NativeSyncClient = SyncClient<NativeWebSocket>;

/// Keeps one open canvas in sync with the relay server.
pub struct SyncClient<T: Transport> {
    board: BoardState,
    transport: T,
    tokens: Arc<dyn TokenStore>,
    ws_url: String,
    /// Identifies this client in logs.
    peer_id: Uuid,
    /// Outbound messages not yet handed to the transport.
    outgoing: Vec<ClientMessage>,
    /// A join for the open canvas was handed to the transport.
    joined: bool,
}

impl NativeSyncClient {
    /// A client over a fresh native socket, pointed at `config.ws_url`.
    pub fn from_config(config: &ClientConfig, tokens: Arc<dyn TokenStore>) -> Self {
        Self::new(NativeWebSocket::new(), tokens, config.ws_url.as_str())
    }

    /// Like [`from_config`](Self::from_config), reading endpoints from the environment.
    pub fn from_env(tokens: Arc<dyn TokenStore>) -> ClientResult<Self> {
        let config = ClientConfig::from_env()?;
        Ok(Self::from_config(&config, tokens))
    }
}

impl<T: Transport> SyncClient<T> {
    pub fn new(transport: T, tokens: Arc<dyn TokenStore>, ws_url: impl Into<String>) -> Self {
        Self {
            board: BoardState::new(),
            transport,
            tokens,
            ws_url: ws_url.into(),
            peer_id: Uuid::new_v4(),
            outgoing: Vec::new(),
            joined: false,
        }
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    pub fn canvas_id(&self) -> Option<&str> {
        self.board.canvas_id()
    }

    pub fn peer_id(&self) -> Uuid {
        self.peer_id
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.transport.state()
    }

    /// Whether local edits are still accepted for this session.
    pub fn can_edit(&self) -> bool {
        self.board.is_authorized()
    }

    /// Switch to `canvas_id` and join its session.
    ///
    /// The previous session is detached first, so nothing it still had in
    /// flight reaches the new board. Without a stored token the board is
    /// reset but nothing is sent.
    pub fn open_canvas(&mut self, canvas_id: &str) -> ClientResult<()> {
        self.leave();
        self.board.reset_for_canvas(Some(canvas_id.to_string()));

        let token = self.tokens.load()?.ok_or(AuthError::MissingToken)?;
        self.transport.connect(&self.ws_url)?;
        log::info!("peer {} joining canvas {}", self.peer_id, canvas_id);
        self.queue(ClientMessage::JoinCanvas {
            canvas_id: canvas_id.to_string(),
            token,
        });
        self.flush()?;
        self.joined = true;
        Ok(())
    }

    /// Detach from the current session. The board keeps its contents.
    pub fn leave(&mut self) {
        if self.transport.state() != ConnectionState::Disconnected {
            log::info!("peer {} leaving canvas {:?}", self.peer_id, self.board.canvas_id());
        }
        self.transport.disconnect();
        self.outgoing.clear();
        self.joined = false;
    }

    /// Admit the snapshot from the initial REST load and make it the only
    /// history entry.
    pub fn load_snapshot(&mut self, elements: Vec<DrawingElement>) {
        if let Err(e) = self.board.dispatch(Action::SetElements(elements.clone())) {
            log::warn!("failed to admit loaded snapshot: {}", e);
            return;
        }
        if let Err(e) = self.board.dispatch(Action::SetHistory(elements)) {
            log::warn!("failed to reset history from loaded snapshot: {}", e);
        }
    }

    /// Fetch the open canvas over REST and admit it.
    ///
    /// Failures are logged and leave the board unchanged.
    pub fn fetch_snapshot(&mut self, api: &ApiClient) {
        let Some(canvas_id) = self.board.canvas_id().map(str::to_string) else {
            log::debug!("no canvas open; skipping load");
            return;
        };
        match api.load_canvas(&canvas_id) {
            Ok(elements) => self.load_snapshot(elements),
            Err(e) => log::warn!("failed to load canvas {}: {}", canvas_id, e),
        }
    }

    /// Drain transport events and admit inbound messages.
    pub fn poll(&mut self) -> Vec<SyncEvent> {
        let mut events = Vec::new();
        for event in self.transport.poll_events() {
            match event {
                TransportEvent::Connected => events.push(SyncEvent::Connected),
                TransportEvent::Disconnected => events.push(SyncEvent::Disconnected),
                TransportEvent::Error { message } => {
                    log::warn!("channel error: {}", message);
                    events.push(SyncEvent::Error { message });
                }
                TransportEvent::Message(text) => events.extend(self.handle_message(&text)),
            }
        }
        events
    }

    /// Admit one raw message from the server.
    pub fn handle_message(&mut self, text: &str) -> Option<SyncEvent> {
        let msg: ServerMessage = match serde_json::from_str(text) {
            Ok(msg) => msg,
            Err(e) => {
                log::warn!("ignoring malformed server message: {}", e);
                return None;
            }
        };
        if self.board.canvas_id().is_none() {
            log::debug!("no canvas open; dropping {:?}", msg);
            return None;
        }

        match msg {
            ServerMessage::LoadCanvas(elements) => {
                let element_count = elements.len();
                self.admit(elements)?;
                Some(SyncEvent::CanvasLoaded { element_count })
            }
            ServerMessage::ReceiveDrawingUpdate(elements) => {
                let element_count = elements.len();
                self.admit(elements)?;
                Some(SyncEvent::UpdateReceived { element_count })
            }
            ServerMessage::Unauthorized(denial) => {
                if let Err(e) = self.board.dispatch(Action::RevokeAuthorization) {
                    log::warn!("failed to revoke edit rights: {}", e);
                }
                self.outgoing.clear();
                Some(SyncEvent::Unauthorized {
                    message: denial.message,
                })
            }
        }
    }

    /// Translate one input event into board actions.
    ///
    /// Errors mean the action was rejected and the board is unchanged. An
    /// applied edit that could not be sent is logged, not returned.
    pub fn handle_input(&mut self, event: InputEvent) -> ClientResult<()> {
        match event {
            InputEvent::SelectTool(tool) => {
                self.board.dispatch(Action::ChangeTool(tool))?;
            }
            InputEvent::PointerDown { position, style } => {
                self.ensure_editable()?;
                if self.board.active_tool() == ToolKind::Eraser {
                    self.board
                        .dispatch(Action::ChangeActionType(ActionType::Erasing))?;
                    self.board.dispatch(Action::Erase {
                        x: position.x,
                        y: position.y,
                    })?;
                    self.broadcast();
                } else {
                    self.board.dispatch(Action::DrawDown {
                        x: position.x,
                        y: position.y,
                        style,
                    })?;
                }
            }
            InputEvent::PointerMove { position } => match self.board.action_type() {
                ActionType::Drawing => {
                    self.board.dispatch(Action::DrawMove {
                        x: position.x,
                        y: position.y,
                    })?;
                    self.broadcast();
                }
                ActionType::Erasing => {
                    self.board.dispatch(Action::Erase {
                        x: position.x,
                        y: position.y,
                    })?;
                    self.broadcast();
                }
                ActionType::None | ActionType::Writing => {}
            },
            InputEvent::PointerUp { .. } => match self.board.action_type() {
                ActionType::Drawing => {
                    self.board.dispatch(Action::DrawUp)?;
                    self.board.dispatch(Action::ChangeActionType(ActionType::None))?;
                    self.broadcast();
                }
                ActionType::Erasing => {
                    self.board.dispatch(Action::ChangeActionType(ActionType::None))?;
                }
                ActionType::None | ActionType::Writing => {}
            },
            InputEvent::TextCommitted(text) => {
                if self.board.action_type() != ActionType::Writing {
                    log::debug!("text committed outside writing mode; ignored");
                    return Ok(());
                }
                self.board.dispatch(Action::ChangeText(text))?;
                self.broadcast();
            }
            InputEvent::Shortcut(shortcut) => {
                let before = self.board.index();
                let action = match shortcut {
                    Shortcut::Undo => Action::Undo,
                    Shortcut::Redo => Action::Redo,
                };
                self.board.dispatch(action)?;
                if self.board.index() != before {
                    self.broadcast();
                }
            }
        }
        if let Err(e) = self.flush() {
            log::warn!("local edit kept but not sent: {}", e);
        }
        Ok(())
    }

    /// Apply a raw board action without broadcasting.
    pub fn dispatch(&mut self, action: Action) -> ClientResult<()> {
        self.board.dispatch(action)?;
        Ok(())
    }

    /// Take queued outbound messages without sending them.
    pub fn take_outgoing(&mut self) -> Vec<ClientMessage> {
        std::mem::take(&mut self.outgoing)
    }

    /// Hand every queued message to the transport, in order.
    ///
    /// Stops at the first failure; unsent messages are dropped.
    pub fn flush(&mut self) -> ClientResult<()> {
        for msg in std::mem::take(&mut self.outgoing) {
            let json = serde_json::to_string(&msg).map_err(|e| {
                crate::error::NetworkError::Decode(format!("Failed to encode message: {}", e))
            })?;
            if let Err(e) = self.transport.send(&json) {
                log::warn!("failed to send update: {}", e);
                return Err(e.into());
            }
        }
        Ok(())
    }

    fn admit(&mut self, elements: Vec<DrawingElement>) -> Option<()> {
        match self.board.dispatch(Action::SetElements(elements)) {
            Ok(()) => Some(()),
            Err(e) => {
                log::warn!("failed to admit snapshot: {}", e);
                None
            }
        }
    }

    fn ensure_editable(&self) -> ClientResult<()> {
        if self.board.is_authorized() {
            Ok(())
        } else {
            Err(ClientError::Authorization(format!(
                "canvas {} is read-only",
                self.board.canvas_id().unwrap_or("<none>")
            )))
        }
    }

    /// Queue the full current snapshot for the open canvas.
    fn broadcast(&mut self) {
        if !self.board.is_authorized() {
            log::debug!("read-only session; update not sent");
            return;
        }
        let live = matches!(
            self.transport.state(),
            ConnectionState::Connected | ConnectionState::Connecting
        );
        if !self.joined || !live {
            log::debug!("no joined session; update kept locally");
            return;
        }
        let Some(canvas_id) = self.board.canvas_id() else {
            return;
        };
        let msg = ClientMessage::DrawingUpdate {
            canvas_id: canvas_id.to_string(),
            elements: self.board.elements().to_vec(),
        };
        self.queue(msg);
    }

    fn queue(&mut self, msg: ClientMessage) {
        self.outgoing.push(msg);
    }
}
