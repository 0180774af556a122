//! Undo/redo history of full element snapshots.

use crate::elements::DrawingElement;

/// Ordered snapshots of the element collection with an undo/redo cursor.
///
/// The cursor always points at an existing snapshot, so there is at least
/// one entry at all times.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    snapshots: Vec<Vec<DrawingElement>>,
    index: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    /// History holding a single empty snapshot.
    pub fn new() -> Self {
        Self::from_snapshot(Vec::new())
    }

    /// History holding only `elements`, cursor at 0.
    pub fn from_snapshot(elements: Vec<DrawingElement>) -> Self {
        Self {
            snapshots: vec![elements],
            index: 0,
        }
    }

    /// Replace the whole history with `[elements]`.
    pub fn reset(&mut self, elements: Vec<DrawingElement>) {
        self.snapshots = vec![elements];
        self.index = 0;
    }

    /// Drop the redo branch and push `elements` as the newest entry.
    pub fn commit(&mut self, elements: Vec<DrawingElement>) {
        self.snapshots.truncate(self.index + 1);
        self.snapshots.push(elements);
        self.index += 1;
    }

    /// Step back one entry, returning the snapshot now current.
    pub fn undo(&mut self) -> Option<&[DrawingElement]> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        Some(&self.snapshots[self.index])
    }

    /// Step forward one entry, returning the snapshot now current.
    pub fn redo(&mut self) -> Option<&[DrawingElement]> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        Some(&self.snapshots[self.index])
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.snapshots.len()
    }

    /// The snapshot under the cursor.
    pub fn current(&self) -> &[DrawingElement] {
        &self.snapshots[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false; a history has at least one snapshot.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&[DrawingElement]> {
        self.snapshots.get(index).map(Vec::as_slice)
    }

    pub fn snapshots(&self) -> &[Vec<DrawingElement>] {
        &self.snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ElementKind, Style};

    fn element(index: usize) -> DrawingElement {
        DrawingElement::anchored(index, ElementKind::Line, 0.0, 0.0, Style::default())
    }

    #[test]
    fn test_starts_with_empty_snapshot() {
        let history = History::new();
        assert_eq!(history.len(), 1);
        assert_eq!(history.index(), 0);
        assert!(history.current().is_empty());
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_redo_cycle() {
        let mut history = History::new();
        history.commit(vec![element(0)]);
        history.commit(vec![element(0), element(1)]);

        assert_eq!(history.undo().map(<[_]>::len), Some(1));
        assert_eq!(history.undo().map(<[_]>::len), Some(0));
        assert!(history.undo().is_none());
        assert_eq!(history.index(), 0);

        assert_eq!(history.redo().map(<[_]>::len), Some(1));
        assert_eq!(history.redo().map(<[_]>::len), Some(2));
        assert!(history.redo().is_none());
        assert_eq!(history.index(), 2);
    }

    #[test]
    fn test_commit_discards_redo_branch() {
        let mut history = History::new();
        history.commit(vec![element(0)]);
        history.commit(vec![element(0), element(1)]);
        history.undo();
        history.undo();

        history.commit(vec![element(5)]);
        assert_eq!(history.len(), 2);
        assert_eq!(history.index(), 1);
        assert!(!history.can_redo());
        assert_eq!(history.current()[0].index, 5);
    }

    #[test]
    fn test_reset() {
        let mut history = History::new();
        history.commit(vec![element(0)]);
        history.reset(vec![element(1), element(2)]);
        assert_eq!(history.len(), 1);
        assert_eq!(history.index(), 0);
        assert_eq!(history.current().len(), 2);
    }
}
