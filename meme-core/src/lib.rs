//! # Meme Core
//!
//! Editing model for a single-canvas meme editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  meme-core                  │
//! ├─────────────────────────────────────────────┤
//! │  Document        │  Editor session          │
//! │  - Elements      │  - Selection             │
//! │  - Transforms    │  - Pointer gestures      │
//! │  - Z-order       │  - Property patches      │
//! ├─────────────────────────────────────────────┤
//! │  History         │  Meme store              │
//! │  - Snapshots     │  - Validation            │
//! │  - Undo / redo   │  - Memory / JSON dir     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Documents are immutable values: every edit produces a new
//! [`CanvasDocument`] which the [`History`] keeps behind an `Arc`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod document;
pub mod editor;
pub mod element;
pub mod error;
pub mod history;
pub mod properties;
pub mod store;
pub mod transform;

pub use document::CanvasDocument;
pub use editor::Editor;
pub use element::{
    Element, ElementId, ElementKind, ImageFilter, ShapeKind, TextAlign, Transform,
    MIN_ELEMENT_SIZE,
};
pub use error::{CanvasError, CanvasResult};
pub use history::History;
pub use properties::{ElementPatch, PropertyPanel, VariantControls};
pub use store::{
    DocumentStore, JsonDirStore, MemeLibrary, MemeRecord, MemoryDocumentStore, SaveRequest,
    StoreError,
};
pub use transform::{GestureState, Handle, Hit, Point, TransformEngine};

/// Meme core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
