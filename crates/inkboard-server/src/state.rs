//! Shared server state: accounts, sessions, canvases and live rooms.
//!
//! Everything is in memory. Canvas contents are whole snapshots replaced on
//! every update; the last write wins.

use crate::error::ApiError;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use inkboard_core::api::CanvasSummary;
use inkboard_core::elements::DrawingElement;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 256;

/// A frame relayed to a room, tagged with the sending peer.
pub type RoomFrame = (String, String);

struct User {
    id: String,
    salt: String,
    password_hash: String,
}

struct Canvas {
    owner: String,
    shared: Vec<String>,
    elements: Vec<DrawingElement>,
    seq: u64,
}

impl Canvas {
    fn can_access(&self, user_id: &str) -> bool {
        self.owner == user_id || self.shared.iter().any(|u| u == user_id)
    }
}

/// Room state
struct Room {
    tx: broadcast::Sender<RoomFrame>,
    peers: HashSet<String>,
}

impl Room {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            peers: HashSet::new(),
        }
    }
}

/// Shared application state
#[derive(Default)]
pub struct AppState {
    /// Accounts keyed by email.
    users: DashMap<String, User>,
    /// Bearer token to user id.
    sessions: DashMap<String, String>,
    canvases: DashMap<String, Canvas>,
    rooms: DashMap<String, Room>,
    next_seq: AtomicU64,
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
}

fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim().to_lowercase();
    (!email.is_empty()).then_some(email)
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    pub fn register(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let email = normalize_email(email).ok_or(ApiError::MissingCredentials)?;
        if password.is_empty() {
            return Err(ApiError::MissingCredentials);
        }
        match self.users.entry(email.clone()) {
            Entry::Occupied(_) => return Err(ApiError::EmailTaken),
            Entry::Vacant(slot) => {
                let salt = Uuid::new_v4().simple().to_string();
                slot.insert(User {
                    id: Uuid::new_v4().to_string(),
                    password_hash: hash_password(&salt, password),
                    salt,
                });
            }
        }
        tracing::info!("registered {}", email);
        Ok(())
    }

    /// Check credentials and issue a fresh bearer token.
    pub fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let email = normalize_email(email).ok_or(ApiError::MissingCredentials)?;
        let user = self.users.get(&email).ok_or(ApiError::UserNotFound)?;
        if hash_password(&user.salt, password) != user.password_hash {
            return Err(ApiError::InvalidPassword);
        }
        let token = Uuid::new_v4().simple().to_string();
        self.sessions.insert(token.clone(), user.id.clone());
        Ok(token)
    }

    /// The user a bearer token belongs to.
    pub fn authenticate(&self, token: &str) -> Option<String> {
        self.sessions.get(token).map(|id| id.clone())
    }

    fn user_id_for_email(&self, email: &str) -> Option<String> {
        let email = normalize_email(email)?;
        self.users.get(&email).map(|u| u.id.clone())
    }

    // ------------------------------------------------------------------
    // Canvases
    // ------------------------------------------------------------------

    /// Canvases the user owns or was shared, oldest first.
    pub fn list_canvases(&self, user_id: &str) -> Vec<CanvasSummary> {
        let mut visible: Vec<(u64, CanvasSummary)> = self
            .canvases
            .iter()
            .filter(|entry| entry.can_access(user_id))
            .map(|entry| {
                let canvas = entry.value();
                (
                    canvas.seq,
                    CanvasSummary {
                        id: entry.key().clone(),
                        owner: Some(canvas.owner.clone()),
                        shared: canvas.shared.clone(),
                    },
                )
            })
            .collect();
        visible.sort_by_key(|(seq, _)| *seq);
        visible.into_iter().map(|(_, summary)| summary).collect()
    }

    pub fn create_canvas(&self, user_id: &str) -> String {
        let id = Uuid::new_v4().simple().to_string();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.canvases.insert(
            id.clone(),
            Canvas {
                owner: user_id.to_string(),
                shared: Vec::new(),
                elements: Vec::new(),
                seq,
            },
        );
        tracing::info!("user {} created canvas {}", user_id, id);
        id
    }

    /// Delete a canvas. Only the owner may.
    pub fn delete_canvas(&self, user_id: &str, canvas_id: &str) -> Result<(), ApiError> {
        {
            let canvas = self.canvases.get(canvas_id).ok_or(ApiError::CanvasNotFound)?;
            if canvas.owner != user_id {
                return Err(ApiError::Forbidden);
            }
        }
        self.canvases.remove(canvas_id);
        self.rooms.remove(canvas_id);
        tracing::info!("user {} deleted canvas {}", user_id, canvas_id);
        Ok(())
    }

    /// Give the account registered under `email` access. Only the owner may.
    pub fn share_canvas(
        &self,
        user_id: &str,
        canvas_id: &str,
        email: &str,
    ) -> Result<String, ApiError> {
        let target = self.user_id_for_email(email).ok_or(ApiError::ShareTargetNotFound)?;
        let mut canvas = self.canvases.get_mut(canvas_id).ok_or(ApiError::CanvasNotFound)?;
        if canvas.owner != user_id {
            return Err(ApiError::Forbidden);
        }
        if target == canvas.owner {
            return Err(ApiError::ShareWithOwner);
        }
        if !canvas.shared.contains(&target) {
            canvas.shared.push(target);
        }
        Ok("Canvas shared successfully".to_string())
    }

    pub fn load_canvas(
        &self,
        user_id: &str,
        canvas_id: &str,
    ) -> Result<Vec<DrawingElement>, ApiError> {
        let canvas = self.canvases.get(canvas_id).ok_or(ApiError::CanvasNotFound)?;
        if !canvas.can_access(user_id) {
            return Err(ApiError::Forbidden);
        }
        Ok(canvas.elements.clone())
    }

    /// Whether `user_id` may edit `canvas_id`.
    pub fn can_edit(&self, user_id: &str, canvas_id: &str) -> Result<(), ApiError> {
        let canvas = self.canvases.get(canvas_id).ok_or(ApiError::CanvasNotFound)?;
        if canvas.can_access(user_id) {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }

    /// Replace a canvas's contents.
    pub fn store_elements(
        &self,
        canvas_id: &str,
        elements: Vec<DrawingElement>,
    ) -> Result<(), ApiError> {
        let mut canvas = self.canvases.get_mut(canvas_id).ok_or(ApiError::CanvasNotFound)?;
        canvas.elements = elements;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Rooms
    // ------------------------------------------------------------------

    /// Add peer to a canvas room.
    pub fn join_room(&self, canvas_id: &str, peer_id: &str) -> broadcast::Receiver<RoomFrame> {
        let mut room = self.rooms.entry(canvas_id.to_string()).or_insert_with(Room::new);
        room.peers.insert(peer_id.to_string());
        room.tx.subscribe()
    }

    /// Remove peer from a room, dropping the room when it empties.
    pub fn leave_room(&self, canvas_id: &str, peer_id: &str) {
        if let Some(mut room) = self.rooms.get_mut(canvas_id) {
            room.peers.remove(peer_id);
            if room.peers.is_empty() {
                drop(room);
                self.rooms.remove(canvas_id);
            }
        }
    }

    /// Relay a frame to every subscriber of the room.
    pub fn broadcast(&self, canvas_id: &str, from: &str, frame: String) {
        if let Some(room) = self.rooms.get(canvas_id) {
            let _ = room.tx.send((from.to_string(), frame));
        }
    }

    pub fn peer_count(&self, canvas_id: &str) -> usize {
        self.rooms.get(canvas_id).map_or(0, |room| room.peers.len())
    }
}
