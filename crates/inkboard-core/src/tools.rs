//! Tools and interaction modes.

use crate::elements::ElementKind;
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ToolKind {
    Line,
    Rectangle,
    Circle,
    Arrow,
    #[default]
    Brush,
    Text,
    Eraser,
}

impl ToolKind {
    /// The element kind this tool draws, `None` for the eraser.
    pub fn element_kind(self) -> Option<ElementKind> {
        match self {
            ToolKind::Line => Some(ElementKind::Line),
            ToolKind::Rectangle => Some(ElementKind::Rectangle),
            ToolKind::Circle => Some(ElementKind::Circle),
            ToolKind::Arrow => Some(ElementKind::Arrow),
            ToolKind::Brush => Some(ElementKind::Brush),
            ToolKind::Text => Some(ElementKind::Text),
            ToolKind::Eraser => None,
        }
    }

    /// Get all available tools.
    pub fn all() -> &'static [ToolKind] {
        &[
            ToolKind::Line,
            ToolKind::Rectangle,
            ToolKind::Circle,
            ToolKind::Arrow,
            ToolKind::Brush,
            ToolKind::Text,
            ToolKind::Eraser,
        ]
    }
}

/// The transient interaction mode of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionType {
    #[default]
    None,
    Drawing,
    Erasing,
    Writing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_tool_but_eraser_draws() {
        for tool in ToolKind::all() {
            assert_eq!(tool.element_kind().is_none(), *tool == ToolKind::Eraser);
        }
    }
}
