//! Renderer error types.

use std::time::Duration;

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering and export.
#[derive(Debug, Error)]
pub enum RenderError {
    /// An image element's source could not be loaded or decoded.
    #[error("Image for element {element} could not be loaded: {reason}")]
    Decode {
        /// Id of the image element.
        element: String,
        /// Loader or decoder message.
        reason: String,
    },

    /// An image element's source did not load in time.
    #[error("Image for element {element} timed out after {after:?}")]
    Timeout {
        /// Id of the image element.
        element: String,
        /// Configured timeout.
        after: Duration,
    },

    /// Resource loading failed.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// Pixmap allocation or encoding failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// Another export is already running on this exporter.
    #[error("An export is already in progress")]
    ExportInProgress,

    /// Writing the exported file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
