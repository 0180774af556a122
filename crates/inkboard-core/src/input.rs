//! User input events and keyboard shortcuts.

use crate::elements::Style;
use crate::tools::ToolKind;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Board commands bound to keyboard chords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shortcut {
    Undo,
    Redo,
}

impl Shortcut {
    /// Resolve a key press. `Ctrl+Z` undoes, `Ctrl+Shift+Z` and `Ctrl+Y` redo.
    pub fn from_key(key: &str, modifiers: Modifiers) -> Option<Self> {
        if !modifiers.command() {
            return None;
        }
        match key.to_ascii_lowercase().as_str() {
            "z" if modifiers.shift => Some(Shortcut::Redo),
            "z" => Some(Shortcut::Undo),
            "y" => Some(Shortcut::Redo),
            _ => None,
        }
    }
}

/// An input event from the canvas view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    PointerDown { position: Point, style: Style },
    PointerMove { position: Point },
    PointerUp { position: Point },
    /// The text editor lost focus with this content.
    TextCommitted(String),
    SelectTool(ToolKind),
    Shortcut(Shortcut),
}
