//! Editor session: current snapshot, history, selection and gestures.
//!
//! This is the surface a UI drives. Every committed change goes through
//! [`History::record`]; selection is view state and never enters a snapshot.

use std::sync::Arc;

use crate::element::ShapeKind;
use crate::history::History;
use crate::properties::{ElementPatch, PropertyPanel};
use crate::transform::{Hit, Point, TransformEngine};
use crate::{CanvasDocument, CanvasError, CanvasResult, Element, ElementId};

/// An editing session over one document.
#[derive(Debug, Clone)]
pub struct Editor {
    history: History,
    selected: Option<ElementId>,
    engine: TransformEngine,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(CanvasDocument::default())
    }
}

impl Editor {
    /// Start a session whose history begins at `document`.
    #[must_use]
    pub fn new(document: CanvasDocument) -> Self {
        Self::with_history(History::new(document))
    }

    /// Start a session over an existing history.
    #[must_use]
    pub fn with_history(history: History) -> Self {
        Self {
            history,
            selected: None,
            engine: TransformEngine::new(),
        }
    }

    /// The document currently shown.
    #[must_use]
    pub fn document(&self) -> &CanvasDocument {
        self.history.current()
    }

    /// Shared handle to the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<CanvasDocument> {
        Arc::clone(self.history.current())
    }

    /// The undo history.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// The transform engine.
    #[must_use]
    pub fn engine(&self) -> &TransformEngine {
        &self.engine
    }

    /// Currently selected element id.
    #[must_use]
    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    /// Currently selected element.
    #[must_use]
    pub fn selected_element(&self) -> Option<&Element> {
        self.selected.and_then(|id| self.document().element(id))
    }

    /// Control values for the selected element.
    #[must_use]
    pub fn property_panel(&self) -> Option<PropertyPanel> {
        self.selected_element().map(PropertyPanel::from_element)
    }

    /// Change the selection without recording history.
    pub fn select(&mut self, id: Option<ElementId>) {
        self.selected = id.filter(|id| self.document().element(*id).is_some());
    }

    fn commit(&mut self, document: CanvasDocument) {
        self.history.record(document);
    }

    fn add(&mut self, element: Element) -> ElementId {
        let id = element.id;
        tracing::debug!(element = %id, kind = element.kind.name(), "add element");
        let next = self.document().with_element(element);
        self.commit(next);
        self.selected = Some(id);
        id
    }

    /// Add a default text element on top and select it.
    pub fn add_text(&mut self) -> ElementId {
        let element = self.document().create_text();
        self.add(element)
    }

    /// Add an image element showing `src` on top and select it.
    pub fn add_image(&mut self, src: impl Into<String>) -> ElementId {
        let element = self.document().create_image(src);
        self.add(element)
    }

    /// Add a default shape element on top and select it.
    pub fn add_shape(&mut self, shape: ShapeKind) -> ElementId {
        let element = self.document().create_shape(shape);
        self.add(element)
    }

    /// Apply a property patch to element `id` as one history entry.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ElementNotFound`] if the element does not exist.
    pub fn update_element(&mut self, id: ElementId, patch: &ElementPatch) -> CanvasResult<()> {
        let next = self.document().with_updated(id, |e| patch.apply(e))?;
        self.commit(next);
        Ok(())
    }

    /// Apply a property patch to the selected element.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ElementNotFound`] if nothing is selected.
    pub fn update_selected(&mut self, patch: &ElementPatch) -> CanvasResult<()> {
        let id = self
            .selected
            .ok_or_else(|| CanvasError::ElementNotFound("no selection".to_string()))?;
        self.update_element(id, patch)
    }

    /// Remove the selected element. Returns its id, or `None` if nothing was
    /// selected.
    pub fn delete_selected(&mut self) -> Option<ElementId> {
        let id = self.selected.take()?;
        match self.document().without_element(id) {
            Ok(next) => {
                tracing::debug!(element = %id, "delete element");
                self.commit(next);
                Some(id)
            }
            Err(_) => None,
        }
    }

    /// Step back in history. Clears the selection. Returns whether the
    /// document changed.
    pub fn undo(&mut self) -> bool {
        let moved = self.history.undo().is_some();
        if moved {
            self.selected = None;
            self.engine.pointer_up();
        }
        moved
    }

    /// Step forward in history. Clears the selection. Returns whether the
    /// document changed.
    pub fn redo(&mut self) -> bool {
        let moved = self.history.redo().is_some();
        if moved {
            self.selected = None;
            self.engine.pointer_up();
        }
        moved
    }

    /// Whether undo is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether redo is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Pointer pressed at `point`: select what was hit and start a gesture.
    pub fn pointer_down(&mut self, point: Point) -> Hit {
        let hit = self
            .engine
            .pointer_down(self.history.current(), self.selected, point);
        self.selected = match hit {
            Hit::Handle(id, _) | Hit::Element(id) => Some(id),
            Hit::Canvas => None,
        };
        hit
    }

    /// Pointer moved to `point`. Records a snapshot when geometry changed.
    pub fn pointer_move(&mut self, point: Point) -> bool {
        match self.engine.pointer_move(self.history.current(), point) {
            Some(next) => {
                self.commit(next);
                true
            }
            None => false,
        }
    }

    /// Pointer released.
    pub fn pointer_up(&mut self) {
        self.engine.pointer_up();
    }
}
