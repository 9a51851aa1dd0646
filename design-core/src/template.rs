//! Design templates: a named, categorized document for a product.

use serde::{Deserialize, Serialize};

use crate::schema::validate_canvas_data;
use crate::surface::{catalog, ProductType, SurfaceDefinition};
use crate::{CanvasError, CanvasResult, DesignDocument};

/// A reusable starting design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Template identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Gallery category.
    #[serde(default)]
    pub category: String,
    /// Short description.
    #[serde(default)]
    pub description: String,
    /// Preview image reference.
    #[serde(default)]
    pub thumbnail: String,
    /// The design itself.
    pub canvas_data: DesignDocument,
    /// Product the template targets (`tin`, `tent`, ...).
    pub product_type: String,
    /// Search tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Whether the template is listed publicly.
    #[serde(default)]
    pub is_public: bool,
}

impl Template {
    /// Parse a template, validating its `canvasData` first.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `canvasData` is missing or malformed, or
    /// a serialization error for other shape problems.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let canvas_data = value
            .get("canvasData")
            .ok_or_else(|| CanvasError::InvalidRequest("template has no canvasData".to_string()))?;
        validate_canvas_data(canvas_data)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Serialize the template to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CanvasResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// The product this template targets.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::UnknownProduct`] for products without a catalog.
    pub fn product(&self) -> CanvasResult<ProductType> {
        self.product_type.parse()
    }

    /// Surfaces of this template's product for a coverage option.
    ///
    /// # Errors
    ///
    /// See [`catalog`].
    pub fn surfaces(&self, coverage: &str) -> CanvasResult<Vec<SurfaceDefinition>> {
        catalog(self.product()?, coverage)
    }

    /// Whether the template carries a tag (case-insensitive).
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}
