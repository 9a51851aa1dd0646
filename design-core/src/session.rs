//! Editing session: the command interface over one design document.
//!
//! The session owns the current document and its history. Callers pass
//! [`Command`]s in and read the resulting document back; nothing reaches into
//! the document directly.

use crate::history::{History, HistoryConfig};
use crate::mutation::{self, Change, Command};
use crate::template::Template;
use crate::transform::{self, TransformGesture, TransformPolicy};
use crate::{CanvasResult, DesignDocument, Element, ElementId, ElementPatch};

/// Session behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// History limits and coalescing.
    pub history: HistoryConfig,
    /// Start with text boxes in auto-height mode.
    pub text_auto_height: bool,
}

/// One editing session over a design document.
#[derive(Debug, Clone)]
pub struct EditorSession {
    document: DesignDocument,
    history: History<DesignDocument>,
    policy: TransformPolicy,
}

impl EditorSession {
    /// Start a session on an empty canvas.
    #[must_use]
    pub fn new(width: f64, height: f64, background_color: impl Into<String>) -> Self {
        Self::with_document(
            DesignDocument::new(width, height, background_color),
            SessionConfig::default(),
        )
    }

    /// Start a session on an existing document.
    ///
    /// The starting document is the oldest history entry, so undoing every
    /// mutation returns to it.
    #[must_use]
    pub fn with_document(document: DesignDocument, config: SessionConfig) -> Self {
        let mut history = History::new(config.history);
        history.record(document.clone());
        tracing::info!(
            "editing session started: {}x{} canvas, {} elements",
            document.canvas_size().width,
            document.canvas_size().height,
            document.element_count()
        );
        Self {
            document,
            history,
            policy: TransformPolicy {
                text_auto_height: config.text_auto_height,
            },
        }
    }

    /// The current document.
    #[must_use]
    pub fn document(&self) -> &DesignDocument {
        &self.document
    }

    /// The primary selection.
    #[must_use]
    pub fn selected_id(&self) -> Option<&ElementId> {
        self.document.selected_id()
    }

    /// The auxiliary multi-selection.
    #[must_use]
    pub fn selected_ids(&self) -> &[ElementId] {
        self.document.selected_ids()
    }

    /// The primary selected element.
    #[must_use]
    pub fn selected_element(&self) -> Option<&Element> {
        self.document.selected_element()
    }

    /// Apply a command and return the new document.
    ///
    /// Structural changes are recorded in history; selection changes and
    /// commands that leave the content as it was are not.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed patches or creation requests; the
    /// document is unchanged in that case.
    pub fn apply(&mut self, command: Command) -> CanvasResult<&DesignDocument> {
        let applied = mutation::apply(&self.document, command)?;
        let unchanged = applied.document.content_eq(&self.document);
        self.document = applied.document;

        match applied.change {
            Change::SelectionOnly => {}
            Change::Structural { .. } if unchanged => {
                tracing::debug!("command left content unchanged; history untouched");
            }
            Change::Structural { coalesce_key } => {
                let snapshot = self.document.clone();
                match coalesce_key {
                    Some(key) => self.history.record_coalesced(snapshot, key),
                    None => self.history.record(snapshot),
                }
            }
        }
        Ok(&self.document)
    }

    /// Add an element and return its assigned id.
    ///
    /// # Errors
    ///
    /// Never fails for a well-formed element; see [`EditorSession::apply`].
    pub fn add_element(&mut self, element: Element) -> CanvasResult<ElementId> {
        let before = self.document.element_count();
        self.apply(Command::AddElement { element })?;
        debug_assert_eq!(self.document.element_count(), before + 1);
        Ok(self.document.elements()[before].id.clone())
    }

    /// Merge a patch into an element; unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the patch produces a malformed element.
    pub fn update_element(&mut self, id: &ElementId, patch: ElementPatch) -> CanvasResult<()> {
        self.apply(Command::UpdateElement {
            id: id.clone(),
            patch,
        })
        .map(|_| ())
    }

    /// Delete an element; unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Infallible in practice; see [`EditorSession::apply`].
    pub fn delete_element(&mut self, id: &ElementId) -> CanvasResult<()> {
        self.apply(Command::DeleteElement { id: id.clone() }).map(|_| ())
    }

    /// Select an element.
    ///
    /// # Errors
    ///
    /// Infallible in practice; see [`EditorSession::apply`].
    pub fn select_element(&mut self, id: &ElementId) -> CanvasResult<()> {
        self.apply(Command::SelectElement { id: id.clone() }).map(|_| ())
    }

    /// Deselect everything.
    ///
    /// # Errors
    ///
    /// Infallible in practice; see [`EditorSession::apply`].
    pub fn clear_selection(&mut self) -> CanvasResult<()> {
        self.apply(Command::ClearSelection).map(|_| ())
    }

    /// Remove every element.
    ///
    /// # Errors
    ///
    /// Infallible in practice; see [`EditorSession::apply`].
    pub fn clear_canvas(&mut self) -> CanvasResult<()> {
        self.apply(Command::ClearCanvas).map(|_| ())
    }

    /// Replace the elements with a template's design.
    ///
    /// # Errors
    ///
    /// Infallible for a parsed [`Template`]; see [`EditorSession::apply`].
    pub fn load_template(&mut self, template: &Template) -> CanvasResult<&DesignDocument> {
        tracing::info!("loading template '{}' ({})", template.name, template.id);
        self.apply(Command::LoadTemplate {
            document: Box::new(template.canvas_data.clone()),
        })
    }

    /// Whether text boxes are in auto-height mode.
    #[must_use]
    pub fn text_auto_height(&self) -> bool {
        self.policy.text_auto_height
    }

    /// Switch text auto-height mode.
    pub fn set_text_auto_height(&mut self, enabled: bool) {
        self.policy.text_auto_height = enabled;
    }

    /// Resolve a finished resize/rotate gesture and apply it as an update.
    ///
    /// # Errors
    ///
    /// Returns an error if the resolved patch is rejected.
    pub fn apply_transform(
        &mut self,
        id: &ElementId,
        gesture: &TransformGesture,
    ) -> CanvasResult<&DesignDocument> {
        let Some(element) = self.document.element(id) else {
            tracing::debug!("transform ignored: no element {id}");
            return Ok(&self.document);
        };
        let patch = transform::resolve(element, gesture, self.policy);
        self.apply(Command::UpdateElement {
            id: id.clone(),
            patch,
        })
    }

    /// Undo the last structural change. Returns `false` at the oldest state.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        self.document = snapshot.with_selection_of(&self.document);
        true
    }

    /// Redo the next structural change. Returns `false` at the newest state.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        self.document = snapshot.with_selection_of(&self.document);
        true
    }

    /// Whether undo is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether redo is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Number of history entries, including the starting document.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Replace the document with imported JSON. All-or-nothing: a document
    /// that fails validation leaves the session untouched.
    ///
    /// # Errors
    ///
    /// Returns the validation or parse error.
    pub fn import_json(&mut self, json: &str) -> CanvasResult<&DesignDocument> {
        let imported = DesignDocument::from_json(json).inspect_err(|e| {
            tracing::warn!("import refused: {e}");
        })?;
        if !imported.content_eq(&self.document) {
            self.history.record(imported.clone());
        }
        self.document = imported;
        Ok(&self.document)
    }

    /// Serialize the current document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn export_json(&self) -> CanvasResult<String> {
        self.document.to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementKind, Height, RectProps, StarProps, TextProps};
    use crate::history::HistoryConfig;

    fn rect() -> Element {
        Element::new(ElementKind::Rect(RectProps::default()))
    }

    #[test]
    fn test_undo_returns_to_empty_start() {
        let mut session = EditorSession::new(800.0, 600.0, "#ffffff");
        let a = session.add_element(rect()).expect("add");
        session
            .update_element(&a, ElementPatch::new().set("x", 10.0))
            .expect("update");
        session.delete_element(&a).expect("delete");
        assert_eq!(session.history_len(), 4);

        assert!(session.undo());
        assert!(session.undo());
        assert!(session.undo());
        assert!(session.document().is_empty());
        assert!(!session.undo());

        assert!(session.redo());
        assert!(session.redo());
        assert!(session.redo());
        assert!(session.document().is_empty());
        assert!(!session.redo());
    }

    #[test]
    fn test_selection_is_not_history() {
        let mut session = EditorSession::new(800.0, 600.0, "#ffffff");
        let a = session.add_element(rect()).expect("add");
        let len = session.history_len();

        session.clear_selection().expect("clear");
        session.select_element(&a).expect("select");
        assert_eq!(session.history_len(), len);
    }

    #[test]
    fn test_noop_update_does_not_truncate_redo() {
        let mut session = EditorSession::new(800.0, 600.0, "#ffffff");
        session.add_element(rect()).expect("add");
        session.undo();
        assert!(session.can_redo());

        session
            .update_element(&ElementId::from("missing"), ElementPatch::new().set("x", 1.0))
            .expect("no-op");
        assert!(session.can_redo());
    }

    #[test]
    fn test_undo_keeps_valid_selection_only() {
        let mut session = EditorSession::new(800.0, 600.0, "#ffffff");
        let a = session.add_element(rect()).expect("add a");
        let b = session.add_element(rect()).expect("add b");
        assert_eq!(session.selected_id(), Some(&b));

        session.undo();
        assert!(session.selected_id().is_none(), "b no longer exists");

        session.select_element(&a).expect("select");
        session.redo();
        assert_eq!(session.selected_id(), Some(&a));
    }

    #[test]
    fn test_failed_patch_leaves_document() {
        let mut session = EditorSession::new(800.0, 600.0, "#ffffff");
        let a = session.add_element(rect()).expect("add");
        let before = session.document().clone();
        let len = session.history_len();

        let result = session.update_element(&a, ElementPatch::new().set("width", "wide"));
        assert!(result.is_err());
        assert_eq!(session.document(), &before);
        assert_eq!(session.history_len(), len);
    }

    #[test]
    fn test_coalesced_edits_undo_together() {
        let config = SessionConfig {
            history: HistoryConfig {
                max_entries: None,
                coalesce: true,
            },
            text_auto_height: false,
        };
        let mut session = EditorSession::with_document(DesignDocument::default(), config);
        let t = session
            .add_element(Element::new(ElementKind::Text(TextProps::default())))
            .expect("add");

        for text in ["H", "He", "Hel", "Hell", "Hello"] {
            session
                .update_element(&t, ElementPatch::new().set("text", text))
                .expect("type");
        }
        assert_eq!(session.history_len(), 3);

        session.undo();
        let ElementKind::Text(props) = &session.document().elements()[0].kind else {
            panic!("expected text");
        };
        assert_eq!(props.text, TextProps::default().text);
    }

    #[test]
    fn test_apply_transform_on_star_and_text() {
        let mut session = EditorSession::new(800.0, 600.0, "#ffffff");
        let star = session
            .add_element(Element::new(ElementKind::Star(StarProps {
                inner_radius: 30.0,
                outer_radius: 50.0,
                ..StarProps::default()
            })))
            .expect("add star");
        let gesture = TransformGesture::scaling(
            session.document().element(&star).expect("star"),
            2.0,
            2.0,
        );
        session.apply_transform(&star, &gesture).expect("transform");
        let ElementKind::Star(props) = &session.document().element(&star).expect("star").kind else {
            panic!("expected star");
        };
        assert!((props.outer_radius - 100.0).abs() < f64::EPSILON);

        session.set_text_auto_height(true);
        let text = session
            .add_element(Element::new(ElementKind::Text(TextProps::default())).sized(100.0, 30.0))
            .expect("add text");
        let gesture = TransformGesture::scaling(
            session.document().element(&text).expect("text"),
            2.0,
            4.0,
        );
        session.apply_transform(&text, &gesture).expect("transform");
        let updated = session.document().element(&text).expect("text");
        assert_eq!(updated.transform.height, Height::Auto);
        assert!((updated.transform.width - 200.0).abs() < f64::EPSILON);

        let missing = TransformGesture::scaling(updated, 1.0, 1.0);
        let before = session.document().clone();
        session
            .apply_transform(&ElementId::from("missing"), &missing)
            .expect("ignored");
        assert_eq!(session.document(), &before);
    }

    #[test]
    fn test_import_is_all_or_nothing() {
        let mut session = EditorSession::new(800.0, 600.0, "#ffffff");
        session.add_element(rect()).expect("add");
        let before = session.document().clone();

        let bad = r#"{"canvasSize":{"width":"wide","height":10},"elements":[]}"#;
        assert!(session.import_json(bad).is_err());
        assert_eq!(session.document(), &before);

        let good = r##"{"canvasSize":{"width":10,"height":10},"backgroundColor":"#000","elements":[]}"##;
        session.import_json(good).expect("import");
        assert!(session.document().is_empty());
        assert!(session.undo());
        assert!(session.document().content_eq(&before));
    }

    #[test]
    fn test_json_commands_refuse_auto_height_on_non_text() {
        let add = r#"{"op":"addElement","element":{"type":"rect","x":0,"y":0,"width":10,"height":"auto"}}"#;
        assert!(serde_json::from_str::<Command>(add).is_err());

        let template = r#"{"op":"loadTemplate","document":{
            "canvasSize":{"width":100,"height":100},
            "elements":[{"id":"a","type":"star","x":0,"y":0,"width":10,"height":"auto"}]
        }}"#;
        assert!(serde_json::from_str::<Command>(template).is_err());

        let mut session = EditorSession::new(800.0, 600.0, "#ffffff");
        let text = r#"{"op":"addElement","element":{"type":"text","text":"hi","x":0,"y":0,"width":10,"height":"auto"}}"#;
        let command: Command = serde_json::from_str(text).expect("text command");
        session.apply(command).expect("apply");

        let exported = session.export_json().expect("export");
        session.import_json(&exported).expect("own export imports");
        assert_eq!(session.document().element_count(), 1);
    }

    #[test]
    fn test_load_template_command_refuses_duplicate_ids() {
        let mut session = EditorSession::new(800.0, 600.0, "#ffffff");
        let command: Command = serde_json::from_str(
            r#"{"op":"loadTemplate","document":{
                "canvasSize":{"width":100,"height":100},
                "elements":[
                    {"id":"a","type":"rect","x":0,"y":0,"width":10,"height":10},
                    {"id":"a","type":"circle","x":0,"y":0,"width":10,"height":10}
                ]
            }}"#,
        )
        .expect("parse");
        assert!(session.apply(command).is_err());
        assert!(session.document().is_empty());
        assert!(!session.can_undo());
    }

    #[test]
    fn test_default_history_undoes_back_to_empty() {
        let mut session = EditorSession::new(800.0, 600.0, "#ffffff");
        for _ in 0..150 {
            session.add_element(rect()).expect("add");
        }
        let mut undone = 0;
        while session.undo() {
            undone += 1;
        }
        assert_eq!(undone, 150);
        assert!(session.document().is_empty());
    }
}
