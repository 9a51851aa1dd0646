//! Error types for design-document operations.

use thiserror::Error;

use crate::schema::ValidationError;

/// Result type for design-document operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur in design-document operations.
///
/// Unknown element ids are not errors: update, delete and select on a
/// missing id are benign no-ops.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// A patch could not be merged into an element.
    #[error("Invalid patch for element {id}: {reason}")]
    InvalidPatch {
        /// Target element id.
        id: String,
        /// Why the patch was refused.
        reason: String,
    },

    /// An element creation request named an unknown kind or carried bad props.
    #[error("Invalid element request: {0}")]
    InvalidRequest(String),

    /// Imported data failed the validation contract.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Product type is not in the surface catalog.
    #[error("Unknown product type: {0}")]
    UnknownProduct(String),

    /// Coverage option is not offered for the product.
    #[error("Unknown coverage option '{coverage}' for product {product}")]
    UnknownCoverage {
        /// Product type name.
        product: String,
        /// Requested coverage option.
        coverage: String,
    },
}
