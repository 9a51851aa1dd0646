//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Resource loading failed.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// Image bytes could not be decoded.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// The generated SVG scene could not be parsed or rasterized.
    #[error("SVG rendering failed: {0}")]
    Svg(String),

    /// Encoding to the output format failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// The requested export format is not compiled in.
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    /// A blocking render task panicked or was cancelled.
    #[error("Render task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for RenderError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Task(e.to_string())
    }
}
