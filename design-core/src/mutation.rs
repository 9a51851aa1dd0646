//! The mutation engine: pure operations from one document to the next.
//!
//! Every function takes the current document by reference and returns a new
//! one; the input is never modified. [`Command`] is the serializable form of
//! the same operations, dispatched by [`apply`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::history::CoalesceKey;
use crate::schema::ValidationError;
use crate::{CanvasResult, DesignDocument, Element, ElementId, ElementPatch};

/// Offset applied to a duplicated element so it does not sit exactly on top
/// of its source.
pub const DUPLICATE_OFFSET: f64 = 20.0;

/// Z-order moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ZOrder {
    /// Paint last.
    Front,
    /// Paint first.
    Back,
    /// Swap with the next element.
    Forward,
    /// Swap with the previous element.
    Backward,
}

/// An editing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Command {
    /// Append an element under a fresh id and select it.
    AddElement {
        /// The element to add; its id is replaced.
        element: Element,
    },
    /// Build an element from a kind name plus initial properties, then add it.
    CreateElement {
        /// Element kind wire name.
        kind: String,
        /// Initial properties laid over the kind defaults.
        #[serde(default)]
        props: serde_json::Map<String, serde_json::Value>,
    },
    /// Merge a patch into an element.
    UpdateElement {
        /// Target element.
        id: ElementId,
        /// Fields to change.
        patch: ElementPatch,
    },
    /// Remove an element.
    DeleteElement {
        /// Target element.
        id: ElementId,
    },
    /// Copy an element under a fresh id.
    DuplicateElement {
        /// Source element.
        id: ElementId,
    },
    /// Move an element in paint order.
    Reorder {
        /// Target element.
        id: ElementId,
        /// Direction.
        order: ZOrder,
    },
    /// Make one element the sole selection.
    SelectElement {
        /// Target element.
        id: ElementId,
    },
    /// Replace the multi-selection.
    SetSelection {
        /// Selected ids; the first existing one becomes primary.
        ids: Vec<ElementId>,
    },
    /// Deselect everything.
    ClearSelection,
    /// Remove every element.
    ClearCanvas,
    /// Replace all elements with a template's.
    LoadTemplate {
        /// Template document whose elements are copied verbatim.
        document: Box<DesignDocument>,
    },
    /// Change the background color.
    SetBackground {
        /// New background color.
        color: String,
    },
}

impl Command {
    /// Whether the command only touches selection.
    #[must_use]
    pub const fn is_selection_only(&self) -> bool {
        matches!(
            self,
            Self::SelectElement { .. } | Self::SetSelection { .. } | Self::ClearSelection
        )
    }
}

/// What kind of change an applied command made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Elements, size or background may have changed; history-worthy.
    Structural {
        /// Present for updates, so rapid edits of the same fields can merge.
        coalesce_key: Option<CoalesceKey>,
    },
    /// Only selection changed; never recorded in history.
    SelectionOnly,
}

/// Result of [`apply`].
#[derive(Debug, Clone)]
pub struct Applied {
    /// The new document.
    pub document: DesignDocument,
    /// Classification of the change.
    pub change: Change,
}

/// Dispatch a command.
///
/// # Errors
///
/// Fails only for malformed patches, creation requests or template documents
/// with duplicate ids; unknown ids are no-ops.
pub fn apply(doc: &DesignDocument, command: Command) -> CanvasResult<Applied> {
    let selection_only = command.is_selection_only();
    let mut coalesce_key = None;

    let document = match command {
        Command::AddElement { element } => add_element(doc, element).0,
        Command::CreateElement { kind, props } => {
            add_element(doc, Element::from_request(&kind, props)?).0
        }
        Command::UpdateElement { id, patch } => {
            coalesce_key = Some(CoalesceKey {
                element: id.to_string(),
                fields: patch.field_names(),
            });
            update_element(doc, &id, &patch)?
        }
        Command::DeleteElement { id } => delete_element(doc, &id),
        Command::DuplicateElement { id } => duplicate_element(doc, &id).0,
        Command::Reorder { id, order } => reorder_element(doc, &id, order),
        Command::SelectElement { id } => select_element(doc, &id),
        Command::SetSelection { ids } => set_selection(doc, &ids),
        Command::ClearSelection => clear_selection(doc),
        Command::ClearCanvas => clear_canvas(doc),
        Command::LoadTemplate { document } => {
            let mut seen = HashSet::with_capacity(document.elements.len());
            if let Some(dup) = document.elements.iter().find(|e| !seen.insert(&e.id)) {
                return Err(ValidationError::DuplicateId(dup.id.to_string()).into());
            }
            load_template(doc, &document)
        }
        Command::SetBackground { color } => set_background(doc, color),
    };

    let change = if selection_only {
        Change::SelectionOnly
    } else {
        Change::Structural { coalesce_key }
    };
    Ok(Applied { document, change })
}

/// Append `element` under a fresh id and make it the sole selection.
#[must_use]
pub fn add_element(doc: &DesignDocument, mut element: Element) -> (DesignDocument, ElementId) {
    let id = ElementId::new();
    element.id = id.clone();
    tracing::debug!("add {} element {id}", element.type_name());

    let mut next = doc.clone();
    next.elements.push(element);
    next.selected_id = Some(id.clone());
    next.selected_ids = vec![id.clone()];
    (next, id)
}

/// Merge `patch` into the element with `id`. Unknown ids leave the document
/// unchanged.
///
/// # Errors
///
/// Returns [`crate::CanvasError::InvalidPatch`] if the merged element would be
/// malformed.
pub fn update_element(
    doc: &DesignDocument,
    id: &ElementId,
    patch: &ElementPatch,
) -> CanvasResult<DesignDocument> {
    let Some(index) = doc.index_of(id) else {
        tracing::debug!("update ignored: no element {id}");
        return Ok(doc.clone());
    };

    let updated = patch.apply_to(&doc.elements[index])?;
    let mut next = doc.clone();
    next.elements[index] = updated;
    tracing::debug!("update element {id}: {:?}", patch.field_names());
    Ok(next)
}

/// Remove the element with `id`, clearing it from the selection.
#[must_use]
pub fn delete_element(doc: &DesignDocument, id: &ElementId) -> DesignDocument {
    if !doc.contains(id) {
        tracing::debug!("delete ignored: no element {id}");
        return doc.clone();
    }

    let mut next = doc.clone();
    next.elements.retain(|e| &e.id != id);
    if next.selected_id.as_ref() == Some(id) {
        next.selected_id = None;
    }
    next.selected_ids.retain(|s| s != id);
    tracing::debug!("delete element {id}");
    next
}

/// Copy the element with `id` under a fresh id, offset and selected.
#[must_use]
pub fn duplicate_element(
    doc: &DesignDocument,
    id: &ElementId,
) -> (DesignDocument, Option<ElementId>) {
    let Some(source) = doc.element(id) else {
        tracing::debug!("duplicate ignored: no element {id}");
        return (doc.clone(), None);
    };

    let copy = source
        .clone()
        .at(source.transform.x + DUPLICATE_OFFSET, source.transform.y + DUPLICATE_OFFSET);
    let (next, new_id) = add_element(doc, copy);
    (next, Some(new_id))
}

/// Move the element with `id` in paint order.
#[must_use]
pub fn reorder_element(doc: &DesignDocument, id: &ElementId, order: ZOrder) -> DesignDocument {
    let Some(index) = doc.index_of(id) else {
        tracing::debug!("reorder ignored: no element {id}");
        return doc.clone();
    };

    let mut next = doc.clone();
    let last = next.elements.len() - 1;
    match order {
        ZOrder::Front => {
            let element = next.elements.remove(index);
            next.elements.push(element);
        }
        ZOrder::Back => {
            let element = next.elements.remove(index);
            next.elements.insert(0, element);
        }
        ZOrder::Forward if index < last => next.elements.swap(index, index + 1),
        ZOrder::Backward if index > 0 => next.elements.swap(index, index - 1),
        ZOrder::Forward | ZOrder::Backward => {}
    }
    next
}

/// Make the element with `id` the sole selection.
#[must_use]
pub fn select_element(doc: &DesignDocument, id: &ElementId) -> DesignDocument {
    if !doc.contains(id) {
        tracing::debug!("select ignored: no element {id}");
        return doc.clone();
    }

    let mut next = doc.clone();
    next.selected_id = Some(id.clone());
    next.selected_ids = vec![id.clone()];
    next
}

/// Replace the multi-selection; the first existing id becomes primary.
#[must_use]
pub fn set_selection(doc: &DesignDocument, ids: &[ElementId]) -> DesignDocument {
    let mut next = doc.clone();
    next.selected_ids = Vec::with_capacity(ids.len());
    for id in ids {
        if doc.contains(id) && !next.selected_ids.contains(id) {
            next.selected_ids.push(id.clone());
        }
    }
    next.selected_id = next.selected_ids.first().cloned();
    next
}

/// Deselect everything.
#[must_use]
pub fn clear_selection(doc: &DesignDocument) -> DesignDocument {
    doc.without_selection()
}

/// Remove every element and clear the selection.
#[must_use]
pub fn clear_canvas(doc: &DesignDocument) -> DesignDocument {
    let mut next = doc.without_selection();
    next.elements.clear();
    next
}

/// Replace the elements with the template's, keeping size and background.
#[must_use]
pub fn load_template(doc: &DesignDocument, template: &DesignDocument) -> DesignDocument {
    let mut next = doc.without_selection();
    next.elements = template.elements.clone();
    tracing::debug!("loaded template with {} elements", next.elements.len());
    next
}

/// Change the background color.
#[must_use]
pub fn set_background(doc: &DesignDocument, color: String) -> DesignDocument {
    let mut next = doc.clone();
    next.background_color = color;
    next
}
