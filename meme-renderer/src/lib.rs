//! # Meme Renderer
//!
//! Raster export for Memeforge documents.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          CanvasDocument (render order)      │
//! ├─────────────┬─────────────┬─────────────────┤
//! │ Text        │ Image       │ Shape           │
//! │ usvg/resvg  │ loader +    │ tiny-skia       │
//! │             │ filter      │ paths           │
//! ├─────────────┴─────────────┴─────────────────┤
//! │       tiny-skia pixmap  →  PNG / JPEG       │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod color;
pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod text;

pub use color::Rgba;
pub use error::{RenderError, RenderResult};
pub use export::{
    ExportArtifact, ExportConfig, ExportFormat, ExportOptions, Exporter, Quality,
};
pub use loader::{DefaultImageLoader, ImageLoader, ImageSource, TextureData};
pub use text::has_fonts;

/// Re-exported so callers can inspect rasterized output.
pub use tiny_skia::Pixmap;
