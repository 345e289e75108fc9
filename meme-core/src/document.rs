//! The canvas document: dimensions, background and the ordered element list.
//!
//! Documents are treated as immutable values by the editor. Every edit builds
//! a new document with one of the `with_*` methods so that earlier snapshots
//! held by the history stay untouched.

use serde::{Deserialize, Serialize};

use crate::element::ShapeKind;
use crate::{CanvasError, CanvasResult, Element, ElementId};

/// Default document width in pixels.
pub const DEFAULT_WIDTH: u32 = 1080;

/// Default document height in pixels.
pub const DEFAULT_HEIGHT: u32 = 1080;

/// Default background color.
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

/// A complete canvas composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasDocument {
    /// Document width in pixels.
    pub width: u32,
    /// Document height in pixels.
    pub height: u32,
    /// Background color as CSS hex.
    pub background_color: String,
    /// Elements in insertion order. Draw order is derived from z-index.
    elements: Vec<Element>,
}

impl Default for CanvasDocument {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl CanvasDocument {
    /// Create an empty document with a white background.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background_color: DEFAULT_BACKGROUND.to_string(),
            elements: Vec::new(),
        }
    }

    /// Set the background color.
    #[must_use]
    pub fn with_background(mut self, color: impl Into<String>) -> Self {
        self.background_color = color.into();
        self
    }

    /// Z-index given to the next created element: the current element count.
    #[must_use]
    pub fn next_z_index(&self) -> i32 {
        i32::try_from(self.elements.len()).unwrap_or(i32::MAX)
    }

    /// Build a default text element on top of the stack.
    #[must_use]
    pub fn create_text(&self) -> Element {
        Element::text(self.next_z_index())
    }

    /// Build a default image element on top of the stack.
    #[must_use]
    pub fn create_image(&self, src: impl Into<String>) -> Element {
        Element::image(src, self.next_z_index())
    }

    /// Build a default shape element on top of the stack.
    #[must_use]
    pub fn create_shape(&self, shape: ShapeKind) -> Element {
        Element::shape(shape, self.next_z_index())
    }

    /// A copy of this document with `element` appended.
    #[must_use]
    pub fn with_element(&self, element: Element) -> Self {
        let mut next = self.clone();
        next.elements.push(element);
        next
    }

    /// A copy of this document without the element `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not found.
    pub fn without_element(&self, id: ElementId) -> CanvasResult<Self> {
        if self.element(id).is_none() {
            return Err(CanvasError::ElementNotFound(id.to_string()));
        }
        let mut next = self.clone();
        next.elements.retain(|e| e.id != id);
        Ok(next)
    }

    /// A copy of this document with element `id` replaced by `f(element)`.
    ///
    /// The element keeps its id and its position in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not found.
    pub fn with_updated<F>(&self, id: ElementId, f: F) -> CanvasResult<Self>
    where
        F: FnOnce(&Element) -> Element,
    {
        let index = self
            .elements
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| CanvasError::ElementNotFound(id.to_string()))?;
        let mut next = self.clone();
        let mut updated = f(&self.elements[index]);
        updated.id = id;
        next.elements[index] = updated;
        Ok(next)
    }

    /// Get an element by ID.
    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// All elements in insertion order.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Elements in draw order: ascending z-index, ties kept in insertion order.
    #[must_use]
    pub fn render_order(&self) -> Vec<&Element> {
        let mut ordered: Vec<&Element> = self.elements.iter().collect();
        // sort_by_key is stable
        ordered.sort_by_key(|e| e.transform.z_index);
        ordered
    }

    /// Find the element at the given document coordinates.
    /// Returns the ID of the topmost element in draw order.
    #[must_use]
    pub fn element_at(&self, x: f32, y: f32) -> Option<ElementId> {
        self.render_order()
            .into_iter()
            .rev()
            .find(|e| e.contains_point(x, y))
            .map(|e| e.id)
    }

    /// Get the number of elements in the document.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Check if the document has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Serialize the document to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CanvasResult<String> {
        serde_json::to_string(self).map_err(CanvasError::Serialization)
    }

    /// Deserialize a document from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        serde_json::from_str(json).map_err(CanvasError::Serialization)
    }
}
