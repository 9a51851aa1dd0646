//! Validation of untrusted serialized elements and documents.
//!
//! Imports run these checks on the raw JSON before anything is deserialized,
//! so a malformed document is refused as a whole and never partially loaded.

use std::collections::HashSet;

use serde_json::Value;
use thiserror::Error;

use crate::element::ELEMENT_TYPES;

/// Why an element or document failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// The value is not a JSON object.
    #[error("expected a JSON object")]
    NotAnObject,
    /// The element id is missing, empty or not a string.
    #[error("element id must be a non-empty string")]
    InvalidId,
    /// The element type is missing or not recognized.
    #[error("unknown element type: {0}")]
    UnknownType(String),
    /// A required numeric field is missing or not a number.
    #[error("field '{0}' must be a number")]
    NotANumber(&'static str),
    /// Height is neither a number nor `"auto"`.
    #[error("height must be a number or \"auto\"")]
    InvalidHeight,
    /// `"auto"` height on a kind other than text.
    #[error("height \"auto\" is only allowed for text elements, not {0}")]
    AutoHeightNotAllowed(String),
    /// `canvasSize` is missing or its dimensions are not numbers.
    #[error("canvasSize must be an object with numeric width and height")]
    InvalidCanvasSize,
    /// `elements` is missing or not an array.
    #[error("elements must be an array")]
    MissingElements,
    /// Two elements share an id.
    #[error("duplicate element id: {0}")]
    DuplicateId(String),
    /// An element inside a document is invalid.
    #[error("element {index} is invalid: {source}")]
    InvalidElement {
        /// Position of the element in the document.
        index: usize,
        /// The element's own validation failure.
        source: Box<ValidationError>,
    },
}

/// Validate a serialized element.
///
/// # Errors
///
/// Returns the first contract violation found.
pub fn validate_element(value: &Value) -> Result<(), ValidationError> {
    let obj = value.as_object().ok_or(ValidationError::NotAnObject)?;

    match obj.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => {}
        _ => return Err(ValidationError::InvalidId),
    }

    let kind = match obj.get("type") {
        Some(Value::String(kind)) if ELEMENT_TYPES.contains(&kind.as_str()) => kind.as_str(),
        Some(Value::String(kind)) => return Err(ValidationError::UnknownType(kind.clone())),
        Some(other) => return Err(ValidationError::UnknownType(other.to_string())),
        None => return Err(ValidationError::UnknownType("<missing>".to_string())),
    };

    for field in ["x", "y", "width"] {
        if !obj.get(field).is_some_and(Value::is_number) {
            return Err(ValidationError::NotANumber(field));
        }
    }

    match obj.get("height") {
        Some(Value::Number(_)) => Ok(()),
        Some(Value::String(s)) if s == "auto" => {
            if kind == "text" {
                Ok(())
            } else {
                Err(ValidationError::AutoHeightNotAllowed(kind.to_string()))
            }
        }
        _ => Err(ValidationError::InvalidHeight),
    }
}

/// Validate a serialized design document (`canvasData`).
///
/// # Errors
///
/// Returns the first contract violation found; element failures carry the
/// element's index.
pub fn validate_canvas_data(value: &Value) -> Result<(), ValidationError> {
    let obj = value.as_object().ok_or(ValidationError::NotAnObject)?;

    let size = obj
        .get("canvasSize")
        .and_then(Value::as_object)
        .ok_or(ValidationError::InvalidCanvasSize)?;
    if !size.get("width").is_some_and(Value::is_number)
        || !size.get("height").is_some_and(Value::is_number)
    {
        return Err(ValidationError::InvalidCanvasSize);
    }

    let elements = obj
        .get("elements")
        .and_then(Value::as_array)
        .ok_or(ValidationError::MissingElements)?;

    let mut seen = HashSet::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        validate_element(element).map_err(|e| ValidationError::InvalidElement {
            index,
            source: Box::new(e),
        })?;
        if let Some(id) = element.get("id").and_then(Value::as_str) {
            if !seen.insert(id) {
                return Err(ValidationError::DuplicateId(id.to_string()));
            }
        }
    }

    Ok(())
}

/// Boolean form of [`validate_canvas_data`].
#[must_use]
pub fn is_valid_canvas_data(value: &Value) -> bool {
    validate_canvas_data(value).is_ok()
}
