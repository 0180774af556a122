//! Board state and its transition function.
//!
//! `BoardState` is the single authoritative container for one open canvas.
//! Every change goes through [`BoardState::dispatch`] (or the pure [`apply`]),
//! which either performs the whole transition or leaves the state untouched.

use crate::elements::{DrawingElement, ElementKind, Style, is_near};
use crate::history::History;
use crate::tools::{ActionType, ToolKind};
use thiserror::Error;

/// A failed precondition for a board action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("no element in progress; draw-down must come first")]
    NoActiveElement,
    #[error("last element is {0:?}, not text")]
    NotText(ElementKind),
    #[error("board is read-only for this session")]
    ReadOnly,
}

/// A discrete change request for the board.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ChangeTool(ToolKind),
    ChangeActionType(ActionType),
    /// Start a new element at `(x, y)` with the active tool.
    DrawDown { x: f64, y: f64, style: Style },
    /// Update the element in progress.
    DrawMove { x: f64, y: f64 },
    /// Commit the drawing gesture.
    DrawUp,
    /// Remove every element near `(x, y)` and commit.
    Erase { x: f64, y: f64 },
    /// Set the text of the element in progress and commit.
    ChangeText(String),
    Undo,
    Redo,
    SetCanvasId(Option<String>),
    /// Replace the live elements without touching history.
    SetElements(Vec<DrawingElement>),
    /// Restart history from a single snapshot.
    SetHistory(Vec<DrawingElement>),
    /// Drop edit rights for the rest of the session.
    RevokeAuthorization,
}

impl Action {
    /// Whether this action is a local mutation gated by edit rights.
    pub fn requires_authorization(&self) -> bool {
        matches!(
            self,
            Action::DrawDown { .. } | Action::Erase { .. } | Action::ChangeText(_)
        )
    }
}

/// The whole mutable board for one canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardState {
    elements: Vec<DrawingElement>,
    history: History,
    active_tool: ToolKind,
    action_type: ActionType,
    canvas_id: Option<String>,
    authorized: bool,
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardState {
    /// An empty, authorized board with no canvas selected.
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            history: History::new(),
            active_tool: ToolKind::default(),
            action_type: ActionType::None,
            canvas_id: None,
            authorized: true,
        }
    }

    /// A fresh board for `canvas_id`.
    pub fn for_canvas(canvas_id: impl Into<String>) -> Self {
        Self {
            canvas_id: Some(canvas_id.into()),
            ..Self::new()
        }
    }

    pub fn elements(&self) -> &[DrawingElement] {
        &self.elements
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Cursor into [`history`](Self::history).
    pub fn index(&self) -> usize {
        self.history.index()
    }

    pub fn active_tool(&self) -> ToolKind {
        self.active_tool
    }

    pub fn action_type(&self) -> ActionType {
        self.action_type
    }

    pub fn canvas_id(&self) -> Option<&str> {
        self.canvas_id.as_deref()
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Apply `action` in place.
    ///
    /// On `Err` the state is exactly what it was before the call.
    pub fn dispatch(&mut self, action: Action) -> Result<(), BoardError> {
        if !self.authorized && action.requires_authorization() {
            log::debug!("rejected {action:?}: board is read-only");
            return Err(BoardError::ReadOnly);
        }

        match action {
            Action::ChangeTool(tool) => self.active_tool = tool,
            Action::ChangeActionType(mode) => self.action_type = mode,
            Action::DrawDown { x, y, style } => {
                let Some(kind) = self.active_tool.element_kind() else {
                    return Ok(());
                };
                let index = self.elements.len();
                self.elements
                    .push(DrawingElement::anchored(index, kind, x, y, style));
                self.action_type = if kind == ElementKind::Text {
                    ActionType::Writing
                } else {
                    ActionType::Drawing
                };
            }
            Action::DrawMove { x, y } => {
                let last = self.last_index()?;
                let moved = self.elements[last].moved_to(x, y);
                self.elements[last] = moved;
            }
            Action::DrawUp => {
                if self.action_type == ActionType::Drawing {
                    self.commit();
                }
            }
            Action::Erase { x, y } => {
                if self.action_type == ActionType::Erasing {
                    let before = self.elements.len();
                    self.elements.retain(|el| !is_near(el, x, y));
                    log::debug!("erased {} element(s) at ({x}, {y})", before - self.elements.len());
                    self.commit();
                }
            }
            Action::ChangeText(text) => {
                let last = self.last_index()?;
                let kind = self.elements[last].kind();
                if kind != ElementKind::Text {
                    return Err(BoardError::NotText(kind));
                }
                let updated = self.elements[last].with_text(text);
                self.elements[last] = updated;
                self.commit();
                self.action_type = ActionType::None;
            }
            Action::Undo => {
                if let Some(snapshot) = self.history.undo() {
                    self.elements = snapshot.to_vec();
                }
            }
            Action::Redo => {
                if let Some(snapshot) = self.history.redo() {
                    self.elements = snapshot.to_vec();
                }
            }
            Action::SetCanvasId(id) => self.canvas_id = id,
            Action::SetElements(elements) => self.elements = with_descriptors(elements),
            Action::SetHistory(elements) => {
                let elements = with_descriptors(elements);
                self.history.reset(elements.clone());
                self.elements = elements;
            }
            Action::RevokeAuthorization => {
                if self.authorized {
                    log::warn!("edit rights revoked for canvas {:?}", self.canvas_id);
                }
                self.authorized = false;
            }
        }
        Ok(())
    }

    /// Clear elements and history for a new canvas identity.
    ///
    /// The active tool is kept; edit rights are restored because they belong
    /// to the previous session.
    pub fn reset_for_canvas(&mut self, canvas_id: Option<String>) {
        let tool = self.active_tool;
        *self = Self {
            canvas_id,
            active_tool: tool,
            ..Self::new()
        };
    }

    fn last_index(&self) -> Result<usize, BoardError> {
        self.elements
            .len()
            .checked_sub(1)
            .ok_or(BoardError::NoActiveElement)
    }

    fn commit(&mut self) {
        self.history.commit(self.elements.clone());
    }
}

/// Pure transition: the state that results from applying `action` to `state`.
pub fn apply(state: &BoardState, action: Action) -> Result<BoardState, BoardError> {
    let mut next = state.clone();
    next.dispatch(action)?;
    Ok(next)
}

fn with_descriptors(mut elements: Vec<DrawingElement>) -> Vec<DrawingElement> {
    for el in elements.iter_mut().filter(|el| el.descriptor().is_none()) {
        el.rebuild_descriptor();
    }
    elements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Geometry, Segment};

    fn black() -> Style {
        Style::new("black", None, 2.0)
    }

    fn down(x: f64, y: f64) -> Action {
        Action::DrawDown {
            x,
            y,
            style: black(),
        }
    }

    fn run(state: &mut BoardState, actions: impl IntoIterator<Item = Action>) {
        for action in actions {
            state.dispatch(action).unwrap();
        }
    }

    fn draw_rect(state: &mut BoardState, from: (f64, f64), to: (f64, f64)) {
        run(
            state,
            [
                Action::ChangeTool(ToolKind::Rectangle),
                down(from.0, from.1),
                Action::DrawMove { x: to.0, y: to.1 },
                Action::DrawUp,
                Action::ChangeActionType(ActionType::None),
            ],
        );
    }

    #[test]
    fn test_rectangle_gesture_commits_once() {
        let mut state = BoardState::for_canvas("abc");
        run(
            &mut state,
            [
                Action::ChangeTool(ToolKind::Rectangle),
                down(10.0, 10.0),
                Action::DrawMove { x: 50.0, y: 50.0 },
                Action::DrawUp,
            ],
        );

        let expected = DrawingElement::new(
            0,
            Geometry::Rectangle(Segment {
                x1: 10.0,
                y1: 10.0,
                x2: 50.0,
                y2: 50.0,
            }),
            black(),
        );
        assert_eq!(state.elements(), &[expected.clone()]);
        assert_eq!(state.history().snapshots(), &[vec![], vec![expected]]);
        assert_eq!(state.index(), 1);
    }

    #[test]
    fn test_moves_never_push_history() {
        let mut state = BoardState::new();
        run(&mut state, [down(0.0, 0.0)]);
        for i in 0..20 {
            state
                .dispatch(Action::DrawMove {
                    x: i as f64,
                    y: 1.0,
                })
                .unwrap();
        }
        assert_eq!(state.history().len(), 1);
        assert_eq!(state.index(), 0);

        state.dispatch(Action::DrawUp).unwrap();
        assert_eq!(state.history().len(), 2);
        assert_eq!(state.index(), 1);
    }

    #[test]
    fn test_draw_down_picks_mode_from_tool() {
        let mut state = BoardState::new();
        run(&mut state, [Action::ChangeTool(ToolKind::Text), down(1.0, 1.0)]);
        assert_eq!(state.action_type(), ActionType::Writing);

        let mut state = BoardState::new();
        run(&mut state, [Action::ChangeTool(ToolKind::Line), down(1.0, 1.0)]);
        assert_eq!(state.action_type(), ActionType::Drawing);
    }

    #[test]
    fn test_draw_down_with_eraser_is_ignored() {
        let mut state = BoardState::new();
        state.dispatch(Action::ChangeTool(ToolKind::Eraser)).unwrap();
        let before = state.clone();
        state.dispatch(down(1.0, 1.0)).unwrap();
        assert_eq!(state, before);
    }

    #[test]
    fn test_draw_move_without_draw_down_fails() {
        let state = BoardState::new();
        assert_eq!(
            apply(&state, Action::DrawMove { x: 1.0, y: 1.0 }),
            Err(BoardError::NoActiveElement)
        );
    }

    #[test]
    fn test_draw_up_outside_drawing_is_noop() {
        let mut state = BoardState::new();
        let before = state.clone();
        state.dispatch(Action::DrawUp).unwrap();
        assert_eq!(state, before);
    }

    #[test]
    fn test_undo_at_start_is_noop() {
        let state = BoardState::new();
        assert_eq!(apply(&state, Action::Undo).unwrap(), state);
    }

    #[test]
    fn test_redo_at_end_is_noop() {
        let mut state = BoardState::new();
        draw_rect(&mut state, (0.0, 0.0), (10.0, 10.0));
        assert_eq!(apply(&state, Action::Redo).unwrap(), state);
    }

    #[test]
    fn test_undo_three_times_with_two_entries() {
        let mut state = BoardState::new();
        draw_rect(&mut state, (10.0, 10.0), (50.0, 50.0));
        assert_eq!(state.history().len(), 2);

        state.dispatch(Action::Undo).unwrap();
        assert!(state.elements().is_empty());
        assert_eq!(state.index(), 0);
        let after_first = state.clone();

        state.dispatch(Action::Undo).unwrap();
        state.dispatch(Action::Undo).unwrap();
        assert_eq!(state, after_first);
    }

    #[test]
    fn test_new_work_after_undo_discards_redo_branch() {
        let mut state = BoardState::new();
        draw_rect(&mut state, (0.0, 0.0), (10.0, 10.0));
        draw_rect(&mut state, (20.0, 20.0), (30.0, 30.0));
        state.dispatch(Action::Undo).unwrap();
        state.dispatch(Action::Undo).unwrap();
        assert_eq!(state.index(), 0);

        draw_rect(&mut state, (40.0, 40.0), (60.0, 60.0));
        assert_eq!(state.history().len(), 2);
        assert_eq!(state.index(), 1);
        assert!(!state.can_redo());
        assert_eq!(state.elements().len(), 1);
    }

    #[test]
    fn test_undo_redo_restores_snapshots() {
        let mut state = BoardState::new();
        draw_rect(&mut state, (0.0, 0.0), (10.0, 10.0));
        let after_draw = state.elements().to_vec();
        state.dispatch(Action::Undo).unwrap();
        state.dispatch(Action::Redo).unwrap();
        assert_eq!(state.elements(), after_draw.as_slice());
        assert_eq!(state.history().current(), state.elements());
    }

    #[test]
    fn test_erase_removes_exactly_the_near_elements() {
        let mut state = BoardState::new();
        draw_rect(&mut state, (0.0, 0.0), (100.0, 100.0));
        draw_rect(&mut state, (200.0, 200.0), (300.0, 300.0));
        run(
            &mut state,
            [
                Action::ChangeTool(ToolKind::Eraser),
                Action::ChangeActionType(ActionType::Erasing),
                Action::Erase { x: 0.0, y: 50.0 },
            ],
        );
        assert_eq!(state.elements().len(), 1);
        assert_eq!(state.elements()[0].index, 1);
        assert_eq!(state.history().len(), 4);
        assert_eq!(state.history().current(), state.elements());
    }

    #[test]
    fn test_erase_commits_even_when_nothing_is_removed() {
        let mut state = BoardState::new();
        draw_rect(&mut state, (0.0, 0.0), (100.0, 100.0));
        run(
            &mut state,
            [
                Action::ChangeActionType(ActionType::Erasing),
                Action::Erase { x: 500.0, y: 500.0 },
            ],
        );
        assert_eq!(state.elements().len(), 1);
        assert_eq!(state.history().len(), 3);
        assert_eq!(state.index(), 2);
    }

    #[test]
    fn test_erase_outside_erasing_mode_is_noop() {
        let mut state = BoardState::new();
        draw_rect(&mut state, (0.0, 0.0), (100.0, 100.0));
        let before = state.clone();
        state.dispatch(Action::Erase { x: 0.0, y: 50.0 }).unwrap();
        assert_eq!(state, before);
    }

    #[test]
    fn test_change_text_commits_and_resets_mode() {
        let mut state = BoardState::new();
        run(
            &mut state,
            [
                Action::ChangeTool(ToolKind::Text),
                Action::DrawDown {
                    x: 5.0,
                    y: 5.0,
                    style: Style::new("black", None, 24.0),
                },
                Action::ChangeText("hello".to_string()),
            ],
        );
        assert_eq!(state.elements()[0].text(), Some("hello"));
        assert_eq!(state.action_type(), ActionType::None);
        assert_eq!(state.history().len(), 2);
    }

    #[test]
    fn test_change_text_on_shape_fails_without_change() {
        let mut state = BoardState::new();
        draw_rect(&mut state, (0.0, 0.0), (10.0, 10.0));
        let before = state.clone();
        assert_eq!(
            state.dispatch(Action::ChangeText("x".to_string())),
            Err(BoardError::NotText(ElementKind::Rectangle))
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_set_history_round_trip() {
        let mut source = BoardState::new();
        draw_rect(&mut source, (1.0, 2.0), (3.0, 4.0));
        let snapshot = source.elements().to_vec();

        let mut state = BoardState::new();
        state.dispatch(Action::SetHistory(snapshot.clone())).unwrap();
        assert_eq!(state.elements(), snapshot.as_slice());
        assert_eq!(state.history().len(), 1);
        assert_eq!(state.index(), 0);
    }

    #[test]
    fn test_set_elements_bypasses_history() {
        let mut state = BoardState::new();
        draw_rect(&mut state, (0.0, 0.0), (10.0, 10.0));
        let json = serde_json::to_string(state.elements()).unwrap();
        let remote: Vec<DrawingElement> = serde_json::from_str(&json).unwrap();

        let mut other = BoardState::new();
        other.dispatch(Action::SetElements(remote)).unwrap();
        assert_eq!(other.elements(), state.elements());
        assert_eq!(other.history().len(), 1);
        assert!(other.elements()[0].descriptor().is_some());
    }

    #[test]
    fn test_set_canvas_id_keeps_elements() {
        let mut state = BoardState::new();
        draw_rect(&mut state, (0.0, 0.0), (10.0, 10.0));
        state.dispatch(Action::SetCanvasId(Some("next".to_string()))).unwrap();
        assert_eq!(state.canvas_id(), Some("next"));
        assert_eq!(state.elements().len(), 1);
    }

    #[test]
    fn test_revoked_board_rejects_local_mutations() {
        let mut state = BoardState::for_canvas("abc");
        draw_rect(&mut state, (0.0, 0.0), (10.0, 10.0));
        state.dispatch(Action::RevokeAuthorization).unwrap();
        state.dispatch(Action::ChangeTool(ToolKind::Line)).unwrap();

        let before = state.clone();
        assert_eq!(
            state.dispatch(down(1.0, 1.0)),
            Err(BoardError::ReadOnly)
        );
        assert_eq!(
            state.dispatch(Action::Erase { x: 0.0, y: 0.0 }),
            Err(BoardError::ReadOnly)
        );
        assert_eq!(
            state.dispatch(Action::ChangeText("x".to_string())),
            Err(BoardError::ReadOnly)
        );
        assert_eq!(state, before);

        state.dispatch(Action::SetElements(Vec::new())).unwrap();
        assert!(state.elements().is_empty());
        assert!(!state.is_authorized());
    }

    #[test]
    fn test_reset_for_canvas() {
        let mut state = BoardState::for_canvas("a");
        state.dispatch(Action::ChangeTool(ToolKind::Circle)).unwrap();
        draw_rect(&mut state, (0.0, 0.0), (10.0, 10.0));
        state.dispatch(Action::RevokeAuthorization).unwrap();

        state.reset_for_canvas(Some("b".to_string()));
        assert_eq!(state.canvas_id(), Some("b"));
        assert!(state.elements().is_empty());
        assert_eq!(state.history().len(), 1);
        assert_eq!(state.index(), 0);
        assert!(state.is_authorized());
        assert_eq!(state.active_tool(), ToolKind::Rectangle);
    }
}
