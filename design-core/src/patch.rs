//! Field patches merged into elements by `update_element`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::validate_element;
use crate::{CanvasError, CanvasResult, Element};

/// A partial element: wire field names mapped to new values.
///
/// A patch is merged over the serialized element and the result must still be
/// a well-formed element of the same kind. `null` clears optional fields such
/// as `stroke`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementPatch(Map<String, Value>);

impl ElementPatch {
    /// Create an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON object.
    #[must_use]
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Set a field, builder style.
    #[must_use]
    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Set a field in place.
    pub fn insert(&mut self, field: &str, value: impl Into<Value>) {
        self.0.insert(field.to_string(), value.into());
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    /// Look up a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Number of fields in the patch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the patch sets nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sorted field names, used to group rapid edits of the same fields.
    #[must_use]
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.keys().cloned().collect();
        names.sort();
        names
    }

    /// Merge this patch into `element`, producing the updated element.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidPatch`] if the patch tries to change the
    /// id or kind, or if the merged element is malformed.
    pub fn apply_to(&self, element: &Element) -> CanvasResult<Element> {
        let invalid = |reason: String| CanvasError::InvalidPatch {
            id: element.id.to_string(),
            reason,
        };

        let mut value = serde_json::to_value(element)?;
        let Value::Object(fields) = &mut value else {
            return Err(invalid("element did not serialize to an object".to_string()));
        };

        for (key, new_value) in &self.0 {
            match key.as_str() {
                "id" if new_value.as_str() != Some(element.id.as_str()) => {
                    return Err(invalid("id is immutable".to_string()));
                }
                "type" if new_value.as_str() != Some(element.type_name()) => {
                    return Err(invalid(format!(
                        "cannot change type of a {} element",
                        element.type_name()
                    )));
                }
                "id" | "type" => {}
                _ => {
                    fields.insert(key.clone(), new_value.clone());
                }
            }
        }

        validate_element(&value).map_err(|e| invalid(e.to_string()))?;
        serde_json::from_value(value).map_err(|e| invalid(e.to_string()))
    }
}

impl From<Map<String, Value>> for ElementPatch {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}
