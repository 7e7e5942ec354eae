//! Batch: the clean and review datasets of one set of documents
//!
//! Both datasets sit behind one mutex. Interactive edits, validation merges
//! and escalation moves all take it, so a merge never interleaves with an
//! edit of the same record and a record is never observed in both datasets
//! or in neither.
//!
//! On disk a batch is `<name>.csv` (clean) plus `<name>_review.csv`. An
//! escalation writes the review file before the clean file, and a
//! de-escalation the reverse, so a crash between the two writes leaves a
//! duplicate rather than a loss. [`Batch::open`] resolves such duplicates.
//! The in-memory datasets change only after both writes succeed.
//!
//! A clean record never carries an escalated comment. Ledger edits that
//! would break this are refused, and files that already break it are
//! repaired on open by moving the record under review.

use crate::error::Result;
use crate::escalation::{validate_transition, EscalationError, RecordState};
use crate::events::{ChangeEvent, EventBus};
use formzone_ledger::{Comment, Ledger, LedgerError};
use formzone_records::{ReconcileReport, RecordStore, StoreError};
use formzone_schema::ProjectSchema;
use formzone_validation::{ProjectValidator, ValidationRun};
use parking_lot::Mutex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// The two record collections of a batch
#[derive(Debug, Clone)]
pub struct Datasets {
    /// Active indexing dataset
    pub clean: RecordStore,
    /// Records pending review
    pub review: RecordStore,
}

impl Datasets {
    /// Which dataset holds the document
    #[must_use]
    pub fn locate(&self, key: &str) -> Option<RecordState> {
        if self.clean.find_row(key).is_some() {
            Some(RecordState::Clean)
        } else if self.review.find_row(key).is_some() {
            Some(RecordState::UnderReview)
        } else {
            None
        }
    }

    /// Dataset for a state
    #[must_use]
    pub fn store(&self, state: RecordState) -> &RecordStore {
        match state {
            RecordState::Clean => &self.clean,
            RecordState::UnderReview => &self.review,
        }
    }

    /// Dataset for a state, mutable
    pub fn store_mut(&mut self, state: RecordState) -> &mut RecordStore {
        match state {
            RecordState::Clean => &mut self.clean,
            RecordState::UnderReview => &mut self.review,
        }
    }
}

/// How a document found in both datasets was settled
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateResolution {
    /// Document key
    pub document: String,
    /// Dataset that kept the record
    pub kept: RecordState,
}

/// What happened while opening a batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchOpenReport {
    /// Reconciliation of the clean file
    pub clean: ReconcileReport,
    /// Reconciliation of the review file
    pub review: ReconcileReport,
    /// Documents that were in both files
    pub duplicates: Vec<DuplicateResolution>,
    /// Clean records found with an escalated comment, now under review
    pub moved_to_review: Vec<String>,
}

impl BatchOpenReport {
    /// Whether opening changed the datasets relative to the files
    #[must_use]
    pub fn needs_save(&self) -> bool {
        !self.duplicates.is_empty() || !self.moved_to_review.is_empty()
    }
}

/// Result of an escalation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationOutcome {
    /// Record moved from clean to review
    Moved,
    /// Record was already under review; only its ledger changed
    AlreadyUnderReview,
}

/// An open batch
#[derive(Debug)]
pub struct Batch {
    clean_path: PathBuf,
    review_path: PathBuf,
    datasets: Mutex<Datasets>,
    events: EventBus,
}

/// `<stem>_review.csv` next to the clean file
#[must_use]
pub fn review_path_for(clean_path: &Path) -> PathBuf {
    let stem = clean_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    clean_path.with_file_name(format!("{stem}_review.csv"))
}

impl Batch {
    /// Open both datasets of a batch, creating them empty when absent
    ///
    /// A document present in both files is settled by its review copy: with
    /// an escalated comment it stays under review, otherwise it returns to
    /// clean. A clean record carrying an escalated comment is moved under
    /// review. Neither repair is written back until [`Batch::save`].
    ///
    /// # Errors
    ///
    /// [`StoreError`]s from reading either file.
    pub fn open(
        clean_path: impl Into<PathBuf>,
        schema: &ProjectSchema,
        events: EventBus,
    ) -> Result<(Self, BatchOpenReport)> {
        let clean_path = clean_path.into();
        let review_path = review_path_for(&clean_path);
        let (mut clean, clean_report) = RecordStore::load(&clean_path, schema)?;
        let (mut review, review_report) = RecordStore::load(&review_path, schema)?;

        let mut duplicates = Vec::new();
        for key in clean.keys() {
            let Some(row) = review.find_row(&key) else {
                continue;
            };
            let kept = if review.ledger(row)?.has_escalation() {
                clean.remove(&key);
                RecordState::UnderReview
            } else {
                review.remove(&key);
                RecordState::Clean
            };
            warn!(document = %key, %kept, "document found in both datasets");
            duplicates.push(DuplicateResolution { document: key, kept });
        }

        let mut moved_to_review = Vec::new();
        for key in clean.keys() {
            let Some(row) = clean.find_row(&key) else {
                continue;
            };
            if !clean.ledger(row)?.has_escalation() {
                continue;
            }
            if let Some(record) = clean.remove(&key) {
                review.push(record)?;
                warn!(document = %key, "clean record has an escalated comment; moved under review");
                moved_to_review.push(key);
            }
        }

        info!(
            path = %clean_path.display(),
            clean = clean.len(),
            review = review.len(),
            duplicates = duplicates.len(),
            moved = moved_to_review.len(),
            "batch opened"
        );
        let batch = Self {
            clean_path,
            review_path,
            datasets: Mutex::new(Datasets { clean, review }),
            events,
        };
        let report = BatchOpenReport {
            clean: clean_report,
            review: review_report,
            duplicates,
            moved_to_review,
        };
        Ok((batch, report))
    }

    /// Clean dataset file
    #[inline]
    #[must_use]
    pub fn clean_path(&self) -> &Path {
        &self.clean_path
    }

    /// Review dataset file
    #[inline]
    #[must_use]
    pub fn review_path(&self) -> &Path {
        &self.review_path
    }

    fn path_for(&self, state: RecordState) -> &Path {
        match state {
            RecordState::Clean => &self.clean_path,
            RecordState::UnderReview => &self.review_path,
        }
    }

    /// Run `f` with shared access to both datasets
    pub fn read<R>(&self, f: impl FnOnce(&Datasets) -> R) -> R {
        f(&self.datasets.lock())
    }

    pub(crate) fn events(&self) -> &EventBus {
        &self.events
    }

    /// Which dataset holds the document
    #[must_use]
    pub fn locate(&self, key: &str) -> Option<RecordState> {
        self.datasets.lock().locate(key)
    }

    /// Every document key with its dataset, clean first
    #[must_use]
    pub fn documents(&self) -> Vec<(String, RecordState)> {
        let datasets = self.datasets.lock();
        let clean = datasets.clean.keys().into_iter().map(|k| (k, RecordState::Clean));
        let review = datasets.review.keys().into_iter().map(|k| (k, RecordState::UnderReview));
        clean.chain(review).collect()
    }

    /// Start a record for a document loaded for indexing
    ///
    /// Returns `false` when the document is already in either dataset.
    ///
    /// # Errors
    ///
    /// Store errors from the clean dataset.
    pub fn add_document(&self, key: &str) -> Result<bool> {
        let mut datasets = self.datasets.lock();
        if datasets.locate(key).is_some() {
            return Ok(false);
        }
        datasets.clean.add_document(key)?;
        debug!(document = key, "document added");
        Ok(true)
    }

    /// Run `f` on the document's row in whichever dataset holds it
    ///
    /// Escalation flags `f` leaves on a clean record are cleared again.
    ///
    /// # Errors
    ///
    /// [`StoreError::RowNotFound`] for an unknown document, `f`'s error, or
    /// [`EscalationError::MarkedWhileClean`] when `f` escalated a comment of
    /// a clean record.
    pub fn with_record<R>(
        &self,
        key: &str,
        f: impl FnOnce(&mut RecordStore, usize) -> Result<R, StoreError>,
    ) -> Result<R> {
        let mut datasets = self.datasets.lock();
        let state = datasets
            .locate(key)
            .ok_or_else(|| StoreError::RowNotFound(key.to_string()))?;
        let (store, row) = locate_row(&mut datasets, key)?;
        let out = f(store, row)?;
        if state == RecordState::Clean {
            if let Some(row) = store.find_row(key) {
                let ledger = store.ledger_mut(row)?;
                if ledger.has_escalation() {
                    ledger.clear_escalation();
                    return Err(EscalationError::MarkedWhileClean(key.to_string()).into());
                }
            }
        }
        Ok(out)
    }

    /// Run `f` on a copy of the document's comment ledger, keeping the
    /// copy only when `f` succeeds
    ///
    /// # Errors
    ///
    /// [`StoreError::RowNotFound`] for an unknown document, `f`'s error, or
    /// [`EscalationError::MarkedWhileClean`] when the result would leave an
    /// escalated comment on a clean record.
    pub fn with_ledger<R>(
        &self,
        key: &str,
        f: impl FnOnce(&mut Ledger) -> Result<R, LedgerError>,
    ) -> Result<R> {
        let mut datasets = self.datasets.lock();
        let state = datasets
            .locate(key)
            .ok_or_else(|| StoreError::RowNotFound(key.to_string()))?;
        let (store, row) = locate_row(&mut datasets, key)?;
        let current = store.ledger_mut(row)?;
        let mut ledger = current.clone();
        let out = f(&mut ledger)?;
        if state == RecordState::Clean && ledger.has_escalation() {
            return Err(EscalationError::MarkedWhileClean(key.to_string()).into());
        }
        *current = ledger;
        Ok(out)
    }

    /// Validate one record and merge the findings into its ledger
    ///
    /// Validation and merge happen under the batch lock. Returns the number
    /// of comments added together with the run.
    ///
    /// # Errors
    ///
    /// [`StoreError::RowNotFound`] for an unknown document.
    pub fn validate_record(
        &self,
        key: &str,
        validator: &ProjectValidator<'_>,
    ) -> Result<(usize, ValidationRun)> {
        let mut datasets = self.datasets.lock();
        let (store, row) = locate_row(&mut datasets, key)?;
        let run = validator.validate(store.row(row)?.values());
        let ledger = store.ledger_mut(row)?;
        let mut added = 0;
        for finding in &run.findings {
            if ledger.append(finding.clone().into()) {
                added += 1;
            }
        }
        drop(datasets);

        if added > 0 {
            debug!(document = key, added, "validation findings merged");
        }
        self.events.publish(ChangeEvent::ValidationMerged {
            document: key.to_string(),
            added,
        });
        Ok((added, run))
    }

    /// Write both datasets, review first
    ///
    /// # Errors
    ///
    /// [`StoreError::Csv`] or [`StoreError::Io`].
    pub fn save(&self) -> Result<()> {
        let datasets = self.datasets.lock();
        datasets.review.save(&self.review_path)?;
        datasets.clean.save(&self.clean_path)?;
        Ok(())
    }

    /// Attach `comment` (if absent), mark it escalated, and move the record
    /// to the review dataset
    ///
    /// The review file is written first. Escalating a record already under
    /// review only updates its ledger. On a failed write the batch is left
    /// as it was.
    ///
    /// # Errors
    ///
    /// [`EscalationError::Conflict`] when the document is in neither
    /// dataset; store errors from saving.
    pub fn escalate(&self, key: &str, comment: Comment) -> Result<EscalationOutcome> {
        let mut datasets = self.datasets.lock();
        let state = datasets
            .locate(key)
            .ok_or_else(|| EscalationError::Conflict(key.to_string()))?;

        if state == RecordState::UnderReview {
            let mut review = datasets.review.clone();
            let row = review
                .find_row(key)
                .ok_or_else(|| StoreError::RowNotFound(key.to_string()))?;
            let ledger = review.ledger_mut(row)?;
            ledger.append(comment.clone());
            ledger.mark_escalated(&comment)?;
            review.save(&self.review_path)?;
            datasets.review = review;
            drop(datasets);
            debug!(document = key, "escalated comment added to record under review");
            self.events.publish(ChangeEvent::CommentsChanged { document: key.to_string() });
            return Ok(EscalationOutcome::AlreadyUnderReview);
        }

        validate_transition(state, RecordState::UnderReview)?;
        let mut next = datasets.clone();
        let mut record = next
            .clean
            .remove(key)
            .ok_or_else(|| StoreError::RowNotFound(key.to_string()))?;
        record.ledger_mut().append(comment.clone());
        record.ledger_mut().mark_escalated(&comment)?;
        next.review.push(record)?;

        self.commit(&mut datasets, next, RecordState::UnderReview)?;
        drop(datasets);

        info!(document = key, page = comment.page, field = %comment.field, "document escalated");
        self.events.publish(ChangeEvent::Escalated { document: key.to_string() });
        Ok(EscalationOutcome::Moved)
    }

    /// Clear escalation flags and move the record back to the clean dataset
    ///
    /// Comments themselves are kept. Returns how many flags were cleared.
    ///
    /// # Errors
    ///
    /// [`EscalationError::Conflict`] for an unknown document and
    /// [`EscalationError::IllegalTransition`] for a clean one.
    pub fn deescalate(&self, key: &str) -> Result<usize> {
        let mut datasets = self.datasets.lock();
        let state = datasets
            .locate(key)
            .ok_or_else(|| EscalationError::Conflict(key.to_string()))?;
        validate_transition(state, RecordState::Clean)?;

        let mut next = datasets.clone();
        let mut record = next
            .review
            .remove(key)
            .ok_or_else(|| StoreError::RowNotFound(key.to_string()))?;
        let cleared = record.ledger_mut().clear_escalation();
        next.clean.push(record)?;

        self.commit(&mut datasets, next, RecordState::Clean)?;
        drop(datasets);

        info!(document = key, cleared, "document de-escalated");
        self.events.publish(ChangeEvent::DeEscalated { document: key.to_string() });
        Ok(cleared)
    }

    /// Write `next`, the `first` dataset before the other, then adopt it
    ///
    /// If the second write fails the first file is rewritten from
    /// `current`, which stays untouched.
    fn commit(&self, current: &mut Datasets, next: Datasets, first: RecordState) -> Result<()> {
        let second = match first {
            RecordState::Clean => RecordState::UnderReview,
            RecordState::UnderReview => RecordState::Clean,
        };
        next.store(first).save(self.path_for(first))?;
        if let Err(err) = next.store(second).save(self.path_for(second)) {
            if let Err(restore) = current.store(first).save(self.path_for(first)) {
                error!(
                    path = %self.path_for(first).display(),
                    error = %restore,
                    "could not restore dataset after a failed write; reopen the batch"
                );
            }
            return Err(err.into());
        }
        *current = next;
        Ok(())
    }
}

fn locate_row<'d>(
    datasets: &'d mut Datasets,
    key: &str,
) -> Result<(&'d mut RecordStore, usize), StoreError> {
    let state = datasets
        .locate(key)
        .ok_or_else(|| StoreError::RowNotFound(key.to_string()))?;
    let store = datasets.store_mut(state);
    let row = store
        .find_row(key)
        .ok_or_else(|| StoreError::RowNotFound(key.to_string()))?;
    Ok((store, row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use formzone_schema::{FieldKind, Zone};

    fn schema() -> ProjectSchema {
        let mut schema = ProjectSchema::new();
        schema.define_field(1, "q1", FieldKind::TickBox, Zone::new(0, 0, 10, 10), None).unwrap();
        schema.define_field(1, "note", FieldKind::TextField, Zone::new(0, 20, 90, 10), None).unwrap();
        schema
    }

    fn open(dir: &Path) -> Batch {
        Batch::open(dir.join("b.csv"), &schema(), EventBus::default()).unwrap().0
    }

    #[test]
    fn review_path_naming() {
        assert_eq!(review_path_for(Path::new("/data/batch01.csv")), PathBuf::from("/data/batch01_review.csv"));
        assert_eq!(review_path_for(Path::new("batch")), PathBuf::from("batch_review.csv"));
    }

    #[test]
    fn escalate_moves_record() {
        let dir = tempfile::tempdir().unwrap();
        let batch = open(dir.path());
        batch.add_document("a.tif").unwrap();

        let outcome = batch.escalate("a.tif", Comment::new(1, "q1", "illegible")).unwrap();
        assert_eq!(outcome, EscalationOutcome::Moved);
        assert_eq!(batch.locate("a.tif"), Some(RecordState::UnderReview));
        batch.read(|d| {
            assert!(d.clean.find_row("a.tif").is_none());
            assert!(d.review.ledger(0).unwrap().has_escalation());
        });
        assert!(batch.review_path().exists());
    }

    #[test]
    fn escalate_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let batch = open(dir.path());
        batch.add_document("a.tif").unwrap();
        let comment = Comment::new(1, "q1", "illegible");

        batch.escalate("a.tif", comment.clone()).unwrap();
        let outcome = batch.escalate("a.tif", comment).unwrap();

        assert_eq!(outcome, EscalationOutcome::AlreadyUnderReview);
        batch.read(|d| {
            assert_eq!(d.review.len(), 1);
            assert_eq!(d.review.ledger(0).unwrap().len(), 1);
        });
    }

    #[test]
    fn escalate_unknown_is_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let batch = open(dir.path());
        let err = batch.escalate("ghost.tif", Comment::new(1, "q1", "x")).unwrap_err();
        assert!(matches!(
            err,
            crate::FormzoneError::Escalation(EscalationError::Conflict(_))
        ));
    }

    #[test]
    fn deescalate_requires_review_state() {
        let dir = tempfile::tempdir().unwrap();
        let batch = open(dir.path());
        batch.add_document("a.tif").unwrap();
        assert!(matches!(
            batch.deescalate("a.tif"),
            Err(crate::FormzoneError::Escalation(EscalationError::IllegalTransition { .. }))
        ));

        batch.escalate("a.tif", Comment::new(1, "q1", "illegible")).unwrap();
        assert_eq!(batch.deescalate("a.tif").unwrap(), 1);
        assert_eq!(batch.locate("a.tif"), Some(RecordState::Clean));
        batch.read(|d| {
            let ledger = d.clean.ledger(0).unwrap();
            assert_eq!(ledger.len(), 1);
            assert!(!ledger.has_escalation());
        });
    }

    #[test]
    fn clean_ledger_refuses_escalated_comment() {
        let dir = tempfile::tempdir().unwrap();
        let batch = open(dir.path());
        batch.add_document("a.tif").unwrap();

        let err = batch
            .with_ledger("a.tif", |ledger| Ok(ledger.append(Comment::new(1, "q1", "x").into_escalated())))
            .unwrap_err();
        assert!(matches!(
            err,
            crate::FormzoneError::Escalation(EscalationError::MarkedWhileClean(_))
        ));
        batch.read(|d| assert!(d.clean.ledger(0).unwrap().is_empty()));
    }

    #[test]
    fn failed_ledger_edit_leaves_ledger_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let batch = open(dir.path());
        batch.add_document("a.tif").unwrap();

        let result = batch.with_ledger("a.tif", |ledger| {
            ledger.append(Comment::new(1, "q1", "x"));
            ledger.remove(&Comment::new(1, "note", "absent"))
        });
        assert!(result.is_err());
        batch.read(|d| assert!(d.clean.ledger(0).unwrap().is_empty()));
    }

    #[test]
    fn record_closure_cannot_escalate_clean_record() {
        let dir = tempfile::tempdir().unwrap();
        let batch = open(dir.path());
        batch.add_document("a.tif").unwrap();

        let result = batch.with_record("a.tif", |store, row| {
            store.ledger_mut(row)?.append(Comment::new(1, "q1", "x").into_escalated());
            Ok(())
        });
        assert!(result.is_err());
        batch.read(|d| assert!(!d.clean.ledger(0).unwrap().has_escalation()));
    }

    #[test]
    fn add_document_once() {
        let dir = tempfile::tempdir().unwrap();
        let batch = open(dir.path());
        assert!(batch.add_document("a.tif").unwrap());
        assert!(!batch.add_document("a.tif").unwrap());
        assert_eq!(batch.documents(), vec![("a.tif".to_string(), RecordState::Clean)]);
    }
}
