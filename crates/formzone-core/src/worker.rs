//! Batch validation worker
//!
//! Runs the project's rules over every record of a batch on a blocking
//! worker so the interactive surface stays responsive. Each record's
//! findings are merged into its ledger before the worker moves on, under
//! the batch lock. Cancellation is checked between records; merged records
//! keep their findings.

use crate::batch::Batch;
use crate::error::{FormzoneError, Result};
use crate::project::Project;
use formzone_records::StoreError;
use formzone_validation::RuleFailure;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Records processed so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// Records validated and merged
    pub done: usize,
    /// Records in the batch when the run started
    pub total: usize,
}

/// Outcome of a batch validation run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchValidationReport {
    /// Records in the batch when the run started
    pub records: usize,
    /// Records validated and merged
    pub validated: usize,
    /// Comments added across all records
    pub added: usize,
    /// Run stopped before the last record
    pub cancelled: bool,
    /// Rules that could not run, once per rule
    pub failures: Vec<RuleFailure>,
}

/// Handle to a running batch validation
#[derive(Debug)]
pub struct ValidationHandle {
    cancel: Arc<AtomicBool>,
    progress: watch::Receiver<Progress>,
    task: JoinHandle<Result<BatchValidationReport>>,
}

impl ValidationHandle {
    /// Ask the worker to stop after the current record
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Progress updates
    #[must_use]
    pub fn progress(&self) -> watch::Receiver<Progress> {
        self.progress.clone()
    }

    /// Wait for the run to finish
    ///
    /// # Errors
    ///
    /// The run's error, or [`FormzoneError::Worker`] if the worker panicked.
    pub async fn join(self) -> Result<BatchValidationReport> {
        self.task
            .await
            .map_err(|e| FormzoneError::Worker(e.to_string()))?
    }
}

/// Start validating `batch` on a blocking worker
///
/// Must be called from within a tokio runtime.
#[must_use]
pub fn spawn_validation(project: Arc<Project>, batch: Arc<Batch>) -> ValidationHandle {
    let cancel = Arc::new(AtomicBool::new(false));
    let (progress_tx, progress_rx) = watch::channel(Progress::default());
    let flag = Arc::clone(&cancel);
    let task = tokio::task::spawn_blocking(move || validate_batch(&project, &batch, &flag, &progress_tx));
    ValidationHandle {
        cancel,
        progress: progress_rx,
        task,
    }
}

/// Validate every record of a batch and save it
///
/// The batch is saved at the end, including after a cancellation, when any
/// record was merged.
///
/// # Errors
///
/// Store errors from merging or saving.
pub fn validate_batch(
    project: &Project,
    batch: &Batch,
    cancel: &AtomicBool,
    progress: &watch::Sender<Progress>,
) -> Result<BatchValidationReport> {
    let field_to_page = project.field_to_page();
    let validator = project.validator(&field_to_page);
    let documents = batch.documents();
    let mut report = BatchValidationReport {
        records: documents.len(),
        ..BatchValidationReport::default()
    };
    let mut failed_rules = HashSet::new();
    progress.send_replace(Progress {
        done: 0,
        total: documents.len(),
    });
    info!(records = documents.len(), rules = validator.rule_count(), "batch validation started");

    for (document, _) in &documents {
        if cancel.load(Ordering::SeqCst) {
            report.cancelled = true;
            warn!(validated = report.validated, remaining = documents.len() - report.validated, "batch validation cancelled");
            break;
        }
        let (added, run) = match batch.validate_record(document, &validator) {
            Ok(merged) => merged,
            Err(FormzoneError::Store(StoreError::RowNotFound(_))) => {
                debug!(document = %document, "document left the batch during validation");
                continue;
            }
            Err(other) => return Err(other),
        };
        report.added += added;
        report.validated += 1;
        for failure in run.failures {
            if failed_rules.insert(failure.index) {
                report.failures.push(failure);
            }
        }
        progress.send_replace(Progress {
            done: report.validated,
            total: documents.len(),
        });
    }

    if report.validated > 0 {
        batch.save()?;
    }
    info!(
        validated = report.validated,
        added = report.added,
        failed_rules = report.failures.len(),
        cancelled = report.cancelled,
        "batch validation finished"
    );
    Ok(report)
}
