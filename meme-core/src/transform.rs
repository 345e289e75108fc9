//! Pointer-driven move/resize state machine.
//!
//! The engine never mutates a document. Each pointer-move sample that changes
//! geometry yields a complete new [`CanvasDocument`] for the caller to record.
//!
//! ```text
//!            pointer_down(element)          pointer_move
//!   Idle ─────────────────────────▶ Dragging ───────────┐
//!    ▲  ╲                              │  ▲─────────────┘
//!    │   ╲ pointer_down(handle)        │
//!    │    ▼                            │ pointer_up
//!    │  Resizing(handle) ──────────────┤
//!    └─────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::element::MIN_ELEMENT_SIZE;
use crate::{CanvasDocument, Element, ElementId, Transform};

/// Radius of a corner handle's circular hit zone, in document pixels.
pub const HANDLE_RADIUS: f32 = 4.0;

/// A pointer position in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Point {
    /// Create a point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Compass position of a resize handle on the bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handle {
    /// Top edge.
    N,
    /// Bottom edge.
    S,
    /// Right edge.
    E,
    /// Left edge.
    W,
    /// Top-right corner.
    Ne,
    /// Top-left corner.
    Nw,
    /// Bottom-right corner.
    Se,
    /// Bottom-left corner.
    Sw,
}

impl Handle {
    /// Handles exposed for hit testing.
    pub const CORNERS: [Self; 4] = [Self::Nw, Self::Ne, Self::Sw, Self::Se];

    /// Whether the handle moves the top edge.
    #[must_use]
    pub fn bears_north(self) -> bool {
        matches!(self, Self::N | Self::Ne | Self::Nw)
    }

    /// Whether the handle moves the bottom edge.
    #[must_use]
    pub fn bears_south(self) -> bool {
        matches!(self, Self::S | Self::Se | Self::Sw)
    }

    /// Whether the handle moves the right edge.
    #[must_use]
    pub fn bears_east(self) -> bool {
        matches!(self, Self::E | Self::Ne | Self::Se)
    }

    /// Whether the handle moves the left edge.
    #[must_use]
    pub fn bears_west(self) -> bool {
        matches!(self, Self::W | Self::Nw | Self::Sw)
    }

    /// Offset of the handle from the box center, in the unrotated local frame.
    #[must_use]
    pub fn local_offset(self, width: f32, height: f32) -> (f32, f32) {
        let x = if self.bears_east() {
            width / 2.0
        } else if self.bears_west() {
            -width / 2.0
        } else {
            0.0
        };
        let y = if self.bears_south() {
            height / 2.0
        } else if self.bears_north() {
            -height / 2.0
        } else {
            0.0
        };
        (x, y)
    }
}

/// Apply one incremental resize step for `handle`.
///
/// Width and height never drop below [`MIN_ELEMENT_SIZE`]. West and north
/// handles shift the position by exactly the amount the size changed, so the
/// opposite edge stays fixed even when the size is clamped.
#[must_use]
pub fn resize(transform: Transform, handle: Handle, dx: f32, dy: f32) -> Transform {
    let mut next = transform;

    if handle.bears_east() {
        next.width = (transform.width + dx).max(MIN_ELEMENT_SIZE);
    } else if handle.bears_west() {
        next.width = (transform.width - dx).max(MIN_ELEMENT_SIZE);
        next.x = transform.x + (transform.width - next.width);
    }

    if handle.bears_south() {
        next.height = (transform.height + dy).max(MIN_ELEMENT_SIZE);
    } else if handle.bears_north() {
        next.height = (transform.height - dy).max(MIN_ELEMENT_SIZE);
        next.y = transform.y + (transform.height - next.height);
    }

    next
}

/// Corner handle of `element` under `point`, if any.
#[must_use]
pub fn handle_at(element: &Element, point: Point) -> Option<Handle> {
    let t = &element.transform;
    let (lx, ly) = t.to_local(point.x, point.y);
    Handle::CORNERS.into_iter().find(|handle| {
        let (hx, hy) = handle.local_offset(t.width, t.height);
        (lx - hx).hypot(ly - hy) <= HANDLE_RADIUS
    })
}

/// What a pointer-down landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    /// A resize handle of the selected element.
    Handle(ElementId, Handle),
    /// The body of an element.
    Element(ElementId),
    /// Empty canvas.
    Canvas,
}

/// Interaction state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Moving an element.
    Dragging {
        /// Element being moved.
        element: ElementId,
        /// Pointer position of the previous sample.
        last: Point,
    },
    /// Resizing an element from a handle.
    Resizing {
        /// Element being resized.
        element: ElementId,
        /// Active handle.
        handle: Handle,
        /// Pointer position of the previous sample.
        last: Point,
    },
}

/// Pointer-driven transform engine.
#[derive(Debug, Clone, Default)]
pub struct TransformEngine {
    state: GestureState,
}

impl TransformEngine {
    /// Create an idle engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current gesture state.
    #[must_use]
    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Whether a drag or resize is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self.state, GestureState::Idle)
    }

    /// Active resize handle, if resizing.
    #[must_use]
    pub fn active_handle(&self) -> Option<Handle> {
        match self.state {
            GestureState::Resizing { handle, .. } => Some(handle),
            GestureState::Idle | GestureState::Dragging { .. } => None,
        }
    }

    /// Hit-test `point` and start a gesture if it lands on an element.
    ///
    /// Handles are only live on the `selected` element and take priority over
    /// element bodies.
    pub fn pointer_down(
        &mut self,
        document: &CanvasDocument,
        selected: Option<ElementId>,
        point: Point,
    ) -> Hit {
        let handle_hit = selected
            .and_then(|id| document.element(id))
            .and_then(|element| handle_at(element, point).map(|h| (element.id, h)));

        if let Some((element, handle)) = handle_hit {
            tracing::debug!(%element, ?handle, "resize start");
            self.state = GestureState::Resizing {
                element,
                handle,
                last: point,
            };
            return Hit::Handle(element, handle);
        }

        if let Some(element) = document.element_at(point.x, point.y) {
            tracing::debug!(%element, "drag start");
            self.state = GestureState::Dragging {
                element,
                last: point,
            };
            return Hit::Element(element);
        }

        self.state = GestureState::Idle;
        Hit::Canvas
    }

    /// Apply the delta since the previous sample.
    ///
    /// Returns the new document when geometry changed. If the target element
    /// no longer exists the gesture is abandoned.
    pub fn pointer_move(
        &mut self,
        document: &CanvasDocument,
        point: Point,
    ) -> Option<CanvasDocument> {
        let (id, last) = match self.state {
            GestureState::Idle => return None,
            GestureState::Dragging { element, last }
            | GestureState::Resizing { element, last, .. } => (element, last),
        };

        let Some(element) = document.element(id) else {
            tracing::debug!(element = %id, "gesture target vanished");
            self.state = GestureState::Idle;
            return None;
        };

        let (dx, dy) = (point.x - last.x, point.y - last.y);
        let current = element.transform;
        let next = match self.state {
            GestureState::Dragging { .. } => Transform {
                x: current.x + dx,
                y: current.y + dy,
                ..current
            },
            GestureState::Resizing { handle, .. } => resize(current, handle, dx, dy),
            GestureState::Idle => return None,
        };

        match &mut self.state {
            GestureState::Dragging { last, .. } | GestureState::Resizing { last, .. } => {
                *last = point;
            }
            GestureState::Idle => {}
        }

        if next == current {
            return None;
        }

        document
            .with_updated(id, |e| e.clone().with_transform(next))
            .ok()
    }

    /// End the gesture and return to idle.
    pub fn pointer_up(&mut self) {
        if self.is_active() {
            tracing::debug!("gesture end");
        }
        self.state = GestureState::Idle;
    }
}
