//! QC strategy: review of captured values and comments
//!
//! Everything the index strategy reads, plus comment normalization,
//! escalation and batch-wide review views.

use crate::batch::{Batch, EscalationOutcome};
use crate::error::Result;
use crate::escalation::RecordState;
use crate::index::IndexStrategy;
use crate::project::Project;
use formzone_ledger::Comment;
use formzone_records::StoreError;
use formzone_schema::{value_intent, Field, FieldId, Mode, ModeStrategy, RenderIntent};
use indexmap::IndexMap;
use serde::Serialize;

/// One comment in the batch checklist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistEntry {
    /// Document key
    pub document: String,
    /// Dataset holding the document
    pub state: RecordState,
    /// The comment
    pub comment: Comment,
}

/// Review over one batch
#[derive(Debug, Clone, Copy)]
pub struct QcStrategy<'a> {
    index: IndexStrategy<'a>,
}

impl<'a> QcStrategy<'a> {
    /// Create strategy over a project's batch
    #[inline]
    #[must_use]
    pub fn new(project: &'a Project, batch: &'a Batch) -> Self {
        Self {
            index: IndexStrategy::new(project, batch),
        }
    }

    /// Value reading and capture shared with index mode
    #[inline]
    #[must_use]
    pub fn index(&self) -> &IndexStrategy<'a> {
        &self.index
    }

    /// Page and column name a comment on `id` is filed under
    ///
    /// A grouped button is filed under its group.
    fn comment_target(&self, id: FieldId) -> Result<(u32, String)> {
        let schema = self.index.project().schema();
        let field = schema.get(id)?;
        let name = schema
            .owning_column(id)
            .map_or_else(|| field.name().to_string(), |c| c.name().to_string());
        Ok((field.page(), name))
    }

    /// Comment on a field, normalized onto its column
    ///
    /// # Errors
    ///
    /// Unknown field or document.
    pub fn comment_on_field(&self, document: &str, id: FieldId, message: &str) -> Result<Comment> {
        let (page, field) = self.comment_target(id)?;
        let comment = Comment::new(page, field, message);
        self.index.add_comment(document, comment.clone())?;
        Ok(comment)
    }

    /// Mark `comment` escalated and move the record under review
    ///
    /// # Errors
    ///
    /// See [`Batch::escalate`].
    pub fn escalate(&self, document: &str, comment: Comment) -> Result<EscalationOutcome> {
        self.index.batch().escalate(document, comment)
    }

    /// Escalate with a new comment on a field
    ///
    /// # Errors
    ///
    /// Unknown field, or see [`Batch::escalate`].
    pub fn escalate_field(
        &self,
        document: &str,
        id: FieldId,
        message: &str,
    ) -> Result<EscalationOutcome> {
        let (page, field) = self.comment_target(id)?;
        self.escalate(document, Comment::new(page, field, message))
    }

    /// Return a record under review to the clean dataset
    ///
    /// # Errors
    ///
    /// See [`Batch::deescalate`].
    pub fn deescalate(&self, document: &str) -> Result<usize> {
        self.index.batch().deescalate(document)
    }

    /// Comments of one page of a document, by field
    ///
    /// Several comments on one field are joined with `"; "`.
    ///
    /// # Errors
    ///
    /// [`StoreError::RowNotFound`] for an unknown document.
    pub fn page_comments(&self, document: &str, page: u32) -> Result<IndexMap<String, String>> {
        self.index.batch().with_ledger(document, |ledger| {
            let mut by_field: IndexMap<String, String> = IndexMap::new();
            for comment in ledger.for_page(page) {
                by_field
                    .entry(comment.field.clone())
                    .and_modify(|text| {
                        text.push_str("; ");
                        text.push_str(&comment.message);
                    })
                    .or_insert_with(|| comment.message.clone());
            }
            Ok(by_field)
        })
    }

    /// Every comment in the batch, ordered by page then field
    #[must_use]
    pub fn comment_checklist(&self) -> Vec<ChecklistEntry> {
        let mut entries = self.index.batch().read(|datasets| {
            let mut entries = Vec::new();
            for state in [RecordState::Clean, RecordState::UnderReview] {
                for record in datasets.store(state).iter() {
                    entries.extend(record.ledger().iter().map(|comment| ChecklistEntry {
                        document: record.key().to_string(),
                        state,
                        comment: comment.clone(),
                    }));
                }
            }
            entries
        });
        entries.sort_by(|a, b| {
            (a.comment.page, &a.comment.field).cmp(&(b.comment.page, &b.comment.field))
        });
        entries
    }

    /// Fields configured for batch-wide review
    #[inline]
    #[must_use]
    pub fn review_fields(&self) -> &'a [String] {
        &self.index.project().config().always_review
    }

    /// `(document, value)` for one column across the whole batch
    ///
    /// # Errors
    ///
    /// [`StoreError::FieldNotFound`] for a name that is not a column.
    pub fn field_review(&self, field: &str) -> Result<Vec<(String, String)>> {
        self.index.batch().read(|datasets| -> Result<Vec<(String, String)>> {
            datasets.clean.column(field)?;
            Ok([&datasets.clean, &datasets.review]
                .into_iter()
                .flat_map(|store| store.iter())
                .map(|record| {
                    (
                        record.key().to_string(),
                        record.value(field).unwrap_or_default().to_string(),
                    )
                })
                .collect())
        })
    }

    /// Quick-review fields of one document with their values
    ///
    /// Configured names that are not columns are skipped.
    ///
    /// # Errors
    ///
    /// [`StoreError::RowNotFound`] for an unknown document.
    pub fn quick_review(&self, document: &str) -> Result<Vec<(String, String)>> {
        let fields = &self.index.project().config().quick_review;
        self.index.batch().with_record(document, |store, row| {
            let mut out = Vec::with_capacity(fields.len());
            for field in fields {
                match store.get_value(row, field) {
                    Ok(value) => out.push((field.clone(), value.to_string())),
                    Err(StoreError::FieldNotFound(_)) => {}
                    Err(other) => return Err(other),
                }
            }
            Ok(out)
        })
    }

    /// Preset comment texts
    #[inline]
    #[must_use]
    pub fn presets(&self) -> &'a [String] {
        self.index.project().presets()
    }

    /// Drawing instructions, flagged when the field's column has a comment
    /// on its page
    ///
    /// # Errors
    ///
    /// Unknown field or document.
    pub fn render(&self, document: &str, id: FieldId) -> Result<RenderIntent> {
        let mut intent = self.index.render(document, id)?;
        let (page, column) = self.comment_target(id)?;
        intent.flagged = self
            .index
            .batch()
            .with_ledger(document, |ledger| Ok(ledger.for_page(page).any(|c| c.field == column)))?;
        Ok(intent)
    }
}

impl ModeStrategy for QcStrategy<'_> {
    fn mode(&self) -> Mode {
        Mode::Qc
    }

    fn render_intent(&self, field: &Field, value: &str) -> RenderIntent {
        value_intent(field, value)
    }
}
