//! Inkboard Core Library
//!
//! Board state machine, element geometry and the real-time sync client for the
//! Inkboard collaborative whiteboard.

pub mod api;
pub mod board;
pub mod config;
pub mod credentials;
pub mod elements;
pub mod error;
pub mod history;
pub mod input;
pub mod session;
pub mod sync;
pub mod tools;

pub use api::ApiClient;
pub use board::{Action, BoardError, BoardState, apply};
pub use config::ClientConfig;
pub use credentials::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use elements::{DrawingElement, ElementKind, Geometry, Segment, Style, is_near};
pub use error::{ClientError, ClientResult};
pub use history::History;
pub use input::{InputEvent, Modifiers, Shortcut};
pub use session::{NativeSyncClient, SyncClient};
pub use sync::{ClientMessage, ConnectionState, ServerMessage, SyncEvent, Transport};
pub use tools::{ActionType, ToolKind};
