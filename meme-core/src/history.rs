//! Linear undo/redo history over immutable document snapshots.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::CanvasDocument;

/// Snapshot history with a cursor.
///
/// The cursor always points at a stored snapshot. Entries before it are the
/// past, entries after it are the redo future. Recording a new snapshot
/// discards the redo future.
#[derive(Debug, Clone)]
pub struct History {
    /// Snapshots, oldest first.
    snapshots: VecDeque<Arc<CanvasDocument>>,
    /// Index of the current snapshot.
    cursor: usize,
    /// Maximum number of snapshots kept (oldest dropped when exceeded).
    limit: Option<usize>,
}

impl History {
    /// Create an unbounded history whose only entry is `initial`.
    #[must_use]
    pub fn new(initial: CanvasDocument) -> Self {
        let mut snapshots = VecDeque::new();
        snapshots.push_back(Arc::new(initial));
        Self {
            snapshots,
            cursor: 0,
            limit: None,
        }
    }

    /// Create a history that keeps at most `limit` snapshots (at least one).
    #[must_use]
    pub fn with_limit(initial: CanvasDocument, limit: usize) -> Self {
        Self {
            limit: Some(limit.max(1)),
            ..Self::new(initial)
        }
    }

    /// Record a new snapshot after the cursor and make it current.
    pub fn record(&mut self, document: CanvasDocument) -> Arc<CanvasDocument> {
        self.snapshots.truncate(self.cursor + 1);
        let snapshot = Arc::new(document);
        self.snapshots.push_back(Arc::clone(&snapshot));

        if let Some(limit) = self.limit {
            while self.snapshots.len() > limit {
                self.snapshots.pop_front();
            }
        }
        self.cursor = self.snapshots.len() - 1;

        tracing::trace!(
            cursor = self.cursor,
            len = self.snapshots.len(),
            "history record"
        );
        snapshot
    }

    /// Step back one snapshot. Returns `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<Arc<CanvasDocument>> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(Arc::clone(&self.snapshots[self.cursor]))
    }

    /// Step forward one snapshot. Returns `None` at the newest entry.
    pub fn redo(&mut self) -> Option<Arc<CanvasDocument>> {
        if self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor += 1;
        Some(Arc::clone(&self.snapshots[self.cursor]))
    }

    /// The snapshot under the cursor.
    #[must_use]
    pub fn current(&self) -> &Arc<CanvasDocument> {
        &self.snapshots[self.cursor]
    }

    /// Whether [`History::undo`] would move the cursor.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Whether [`History::redo`] would move the cursor.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// Current cursor position.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of stored snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false: a history holds at least its initial snapshot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ShapeKind;
    use proptest::prelude::*;

    fn grow(doc: &CanvasDocument) -> CanvasDocument {
        doc.with_element(doc.create_shape(ShapeKind::Rectangle))
    }

    #[test]
    fn test_undo_at_start_is_noop() {
        let mut history = History::new(CanvasDocument::default());
        let before = Arc::clone(history.current());
        assert!(history.undo().is_none());
        assert!(Arc::ptr_eq(&before, history.current()));
        assert!(!history.can_undo());
    }

    #[test]
    fn test_redo_at_end_is_noop() {
        let mut history = History::new(CanvasDocument::default());
        history.record(grow(history.current()));
        assert!(history.redo().is_none());
        assert_eq!(history.cursor(), 1);
    }

    #[test]
    fn test_record_truncates_future() {
        let mut history = History::new(CanvasDocument::default());
        let one = grow(history.current());
        history.record(one);
        let two = grow(history.current());
        history.record(two);
        assert_eq!(history.len(), 3);

        history.undo();
        history.undo();
        assert!(history.can_redo());

        let branch = CanvasDocument::new(10, 10);
        history.record(branch.clone());
        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        assert_eq!(**history.current(), branch);
    }

    #[test]
    fn test_undo_redo_returns_same_snapshot() {
        let mut history = History::new(CanvasDocument::default());
        let recorded = history.record(grow(history.current()));
        history.undo();
        let redone = history.redo().expect("redo");
        assert!(Arc::ptr_eq(&recorded, &redone));
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = History::with_limit(CanvasDocument::default(), 3);
        for _ in 0..5 {
            let next = grow(history.current());
            history.record(next);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), 2);
        assert_eq!(history.current().element_count(), 5);

        history.undo();
        history.undo();
        assert!(!history.can_undo());
        assert_eq!(history.current().element_count(), 3);
    }

    proptest! {
        #[test]
        fn prop_n_edits_then_n_undos_restores_initial(n in 0usize..25) {
            let initial = CanvasDocument::default();
            let mut history = History::new(initial.clone());
            for _ in 0..n {
                let next = grow(history.current());
                history.record(next);
            }
            for _ in 0..n {
                prop_assert!(history.undo().is_some());
            }
            prop_assert_eq!(&**history.current(), &initial);
        }

        #[test]
        fn prop_k_undos_then_k_redos_is_identity(n in 1usize..20, k_seed in 0usize..20) {
            let mut history = History::new(CanvasDocument::default());
            for _ in 0..n {
                let next = grow(history.current());
                history.record(next);
            }
            let k = k_seed % (n + 1);
            let before = Arc::clone(history.current());
            for _ in 0..k {
                history.undo();
            }
            for _ in 0..k {
                history.redo();
            }
            prop_assert!(Arc::ptr_eq(&before, history.current()));
        }
    }
}
