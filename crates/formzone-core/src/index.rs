//! Index strategy: value capture per document
//!
//! Operates on the document's row in whichever dataset holds it. Never
//! touches the schema's structure.

use crate::batch::Batch;
use crate::error::{FormzoneError, Result};
use crate::events::ChangeEvent;
use crate::project::Project;
use formzone_ledger::Comment;
use formzone_records::{Completion, StoreError};
use formzone_schema::{
    is_tick_token, value_intent, Field, FieldId, FieldKind, Mode, ModeStrategy, RenderIntent, TICKED,
};
use formzone_validation::{check_value, ValueFlag};
use tracing::debug;

/// Value capture over one batch
#[derive(Debug, Clone, Copy)]
pub struct IndexStrategy<'a> {
    project: &'a Project,
    batch: &'a Batch,
}

impl<'a> IndexStrategy<'a> {
    /// Create strategy over a project's batch
    #[inline]
    #[must_use]
    pub fn new(project: &'a Project, batch: &'a Batch) -> Self {
        Self { project, batch }
    }

    /// Project in use
    #[inline]
    #[must_use]
    pub fn project(&self) -> &'a Project {
        self.project
    }

    /// Batch in use
    #[inline]
    #[must_use]
    pub fn batch(&self) -> &'a Batch {
        self.batch
    }

    fn column_kind(&self, field: &str) -> Result<FieldKind> {
        self.project
            .schema()
            .find(field)
            .map(Field::kind)
            .ok_or_else(|| StoreError::FieldNotFound(field.to_string()).into())
    }

    fn require(
        &self,
        field: &str,
        operation: &'static str,
        expected: &'static str,
        ok: fn(FieldKind) -> bool,
    ) -> Result<FieldKind> {
        let kind = self.column_kind(field)?;
        if ok(kind) {
            Ok(kind)
        } else {
            Err(FormzoneError::WrongKind {
                field: field.to_string(),
                kind,
                operation,
                expected,
            })
        }
    }

    fn store_value(&self, document: &str, field: &str, value: &str) -> Result<()> {
        self.batch
            .with_record(document, |store, row| store.set_value(row, field, value))?;
        debug!(document, field, "value captured");
        self.batch.events().publish(ChangeEvent::ValueSet {
            document: document.to_string(),
            field: field.to_string(),
        });
        Ok(())
    }

    /// Captured value of a column; empty when unset
    ///
    /// # Errors
    ///
    /// [`StoreError::RowNotFound`] or [`StoreError::FieldNotFound`].
    pub fn value(&self, document: &str, field: &str) -> Result<String> {
        self.batch
            .with_record(document, |store, row| store.get_value(row, field).map(str::to_string))
    }

    /// Flip a tick box; returns whether it is now ticked
    ///
    /// Two toggles restore the original state.
    ///
    /// # Errors
    ///
    /// [`FormzoneError::WrongKind`] for anything but a tick box, and record
    /// access errors.
    pub fn toggle_tick(&self, document: &str, field: &str) -> Result<bool> {
        self.require(field, "toggle", "a tick box", |k| k == FieldKind::TickBox)?;
        let ticked = !is_tick_token(&self.value(document, field)?);
        self.store_value(document, field, if ticked { TICKED } else { "" })?;
        Ok(ticked)
    }

    /// Select one button of a group, deselecting any other
    ///
    /// # Errors
    ///
    /// [`FormzoneError::WrongKind`] when `group` is not a group and
    /// [`StoreError::InvalidChoice`] when `button` is not one of its buttons.
    pub fn select_radio(&self, document: &str, group: &str, button: &str) -> Result<()> {
        self.require(group, "select a button of", "a radio group", FieldKind::is_group)?;
        self.store_value(document, group, button)
    }

    /// Deselect every button of a group
    ///
    /// # Errors
    ///
    /// As for [`select_radio`](Self::select_radio).
    pub fn clear_radio(&self, document: &str, group: &str) -> Result<()> {
        self.require(group, "clear", "a radio group", FieldKind::is_group)?;
        self.store_value(document, group, "")
    }

    /// Whether `button` is the selected button of `group`
    ///
    /// # Errors
    ///
    /// Record access errors.
    pub fn is_selected(&self, document: &str, group: &str, button: &str) -> Result<bool> {
        Ok(self.value(document, group)? == button)
    }

    /// Store free text for a text or numeric field
    ///
    /// The value is stored even when it fails the kind's check; the flag is
    /// returned for display.
    ///
    /// # Errors
    ///
    /// [`FormzoneError::WrongKind`] for non-text kinds, and record access
    /// errors.
    pub fn set_text(&self, document: &str, field: &str, value: &str) -> Result<Option<ValueFlag>> {
        let kind = self.require(field, "type into", "a text or numeric field", FieldKind::is_text)?;
        self.store_value(document, field, value)?;
        let flag = check_value(kind, value);
        if let Some(flag) = flag {
            debug!(document, field, %flag, "value flagged");
        }
        Ok(flag)
    }

    /// Append a comment unless an identical one exists
    ///
    /// The comment is stored unescalated; escalation goes through
    /// [`Batch::escalate`].
    ///
    /// # Errors
    ///
    /// [`StoreError::RowNotFound`] for an unknown document.
    pub fn add_comment(&self, document: &str, comment: Comment) -> Result<bool> {
        let comment = Comment { escalated: false, ..comment };
        let added = self.batch.with_ledger(document, |ledger| Ok(ledger.append(comment)))?;
        if added {
            self.comments_changed(document);
        }
        Ok(added)
    }

    /// Replace a comment, keeping its escalation flag
    ///
    /// Any flag on `new` is ignored.
    ///
    /// # Errors
    ///
    /// Ledger errors for a missing `old` or a duplicate `new`.
    pub fn edit_comment(&self, document: &str, old: &Comment, new: Comment) -> Result<()> {
        self.batch.with_ledger(document, |ledger| ledger.edit(old, new))?;
        self.comments_changed(document);
        Ok(())
    }

    /// Remove a comment
    ///
    /// Removing an escalated comment does not de-escalate the record.
    ///
    /// # Errors
    ///
    /// Ledger error when the comment is not present.
    pub fn remove_comment(&self, document: &str, comment: &Comment) -> Result<Comment> {
        let removed = self.batch.with_ledger(document, |ledger| ledger.remove(comment))?;
        self.comments_changed(document);
        Ok(removed)
    }

    fn comments_changed(&self, document: &str) {
        self.batch.events().publish(ChangeEvent::CommentsChanged {
            document: document.to_string(),
        });
    }

    /// Filled versus total columns of the document
    ///
    /// # Errors
    ///
    /// [`StoreError::RowNotFound`] for an unknown document.
    pub fn completion(&self, document: &str) -> Result<Completion> {
        self.batch.with_record(document, |store, row| store.completion(row))
    }

    /// Drawing instructions for one field of a document
    ///
    /// A grouped button is drawn from its group's value; a free button has
    /// no value.
    ///
    /// # Errors
    ///
    /// Unknown field or document.
    pub fn render(&self, document: &str, id: FieldId) -> Result<RenderIntent> {
        let (field, column) = {
            let schema = self.project.schema();
            let field = schema.get(id)?.clone();
            let column = schema.owning_column(id).map(|c| c.name().to_string());
            (field, column)
        };
        let value = match &column {
            Some(column) => self.value(document, column)?,
            None => String::new(),
        };
        Ok(self.render_intent(&field, &value))
    }
}

impl ModeStrategy for IndexStrategy<'_> {
    fn mode(&self) -> Mode {
        Mode::Index
    }

    fn render_intent(&self, field: &Field, value: &str) -> RenderIntent {
        value_intent(field, value)
    }
}
