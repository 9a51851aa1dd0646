//! The design document: canvas size, background, ordered elements and selection.

use serde::{Deserialize, Serialize};

use crate::schema::validate_canvas_data;
use crate::{CanvasResult, Element, ElementId};

/// Default background color for new documents.
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

/// Canvas dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

fn default_background() -> String {
    DEFAULT_BACKGROUND.to_string()
}

/// The complete state of one editable canvas.
///
/// Element order is paint order: the last element is in front. Documents are
/// values; the mutation engine derives new documents from old ones and never
/// edits one that a caller holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignDocument {
    pub(crate) elements: Vec<Element>,
    pub(crate) canvas_size: CanvasSize,
    #[serde(default = "default_background")]
    pub(crate) background_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) selected_id: Option<ElementId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) selected_ids: Vec<ElementId>,
}

impl DesignDocument {
    /// Create an empty document.
    #[must_use]
    pub fn new(width: f64, height: f64, background_color: impl Into<String>) -> Self {
        Self {
            elements: Vec::new(),
            canvas_size: CanvasSize { width, height },
            background_color: background_color.into(),
            selected_id: None,
            selected_ids: Vec::new(),
        }
    }

    /// Elements in paint order.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Look up an element by id.
    #[must_use]
    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| &e.id == id)
    }

    /// Position of an element in paint order.
    #[must_use]
    pub fn index_of(&self, id: &ElementId) -> Option<usize> {
        self.elements.iter().position(|e| &e.id == id)
    }

    /// Whether an element with this id exists.
    #[must_use]
    pub fn contains(&self, id: &ElementId) -> bool {
        self.index_of(id).is_some()
    }

    /// Number of elements.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Whether the document has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Canvas dimensions.
    #[must_use]
    pub fn canvas_size(&self) -> CanvasSize {
        self.canvas_size
    }

    /// Background color.
    #[must_use]
    pub fn background_color(&self) -> &str {
        &self.background_color
    }

    /// Primary selection.
    #[must_use]
    pub fn selected_id(&self) -> Option<&ElementId> {
        self.selected_id.as_ref()
    }

    /// Auxiliary multi-selection.
    #[must_use]
    pub fn selected_ids(&self) -> &[ElementId] {
        &self.selected_ids
    }

    /// The primary selected element.
    #[must_use]
    pub fn selected_element(&self) -> Option<&Element> {
        self.selected_id.as_ref().and_then(|id| self.element(id))
    }

    /// Equality ignoring selection.
    #[must_use]
    pub fn content_eq(&self, other: &Self) -> bool {
        self.elements == other.elements
            && self.canvas_size == other.canvas_size
            && self.background_color == other.background_color
    }

    /// A copy of this document with no selection.
    #[must_use]
    pub fn without_selection(&self) -> Self {
        Self {
            selected_id: None,
            selected_ids: Vec::new(),
            ..self.clone()
        }
    }

    /// This document's content with `other`'s selection, keeping only ids
    /// that still exist here.
    #[must_use]
    pub fn with_selection_of(&self, other: &Self) -> Self {
        let mut doc = self.without_selection();
        doc.selected_id = other.selected_id.clone().filter(|id| doc.contains(id));
        doc.selected_ids = other
            .selected_ids
            .iter()
            .filter(|id| doc.contains(id))
            .cloned()
            .collect();
        doc
    }

    /// Drop selection entries that do not name an element.
    fn prune_selection(mut self) -> Self {
        if self.selected_id.as_ref().is_some_and(|id| !self.contains(id)) {
            self.selected_id = None;
        }
        let ids = std::mem::take(&mut self.selected_ids);
        self.selected_ids = ids.into_iter().filter(|id| self.contains(id)).collect();
        self
    }

    /// Serialize the document to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CanvasResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize the document to indented JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> CanvasResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate and deserialize a document from JSON.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the data breaks the document contract,
    /// or a serialization error if a field has the wrong shape.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Validate and deserialize a document from a JSON value.
    ///
    /// # Errors
    ///
    /// See [`DesignDocument::from_json`].
    pub fn from_value(value: serde_json::Value) -> CanvasResult<Self> {
        validate_canvas_data(&value)?;
        let doc: Self = serde_json::from_value(value)?;
        Ok(doc.prune_selection())
    }
}

impl Default for DesignDocument {
    fn default() -> Self {
        Self::new(800.0, 600.0, DEFAULT_BACKGROUND)
    }
}
