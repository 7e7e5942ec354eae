//! Formzone Core
//!
//! Project context, index and QC strategies, the escalation workflow and
//! batch validation for scanned survey forms.
//!
//! # Overview
//!
//! - **Project**: schema, configuration, strategy registry and lookup list,
//!   opened from a project folder and passed by reference
//! - **Batch**: clean and review datasets behind one lock
//! - **IndexStrategy / QcStrategy**: value capture and review operations
//! - **Escalation**: Clean ⇄ UnderReview state machine
//! - **Worker**: batch validation off the interactive path, cancellable
//!   between records
//! - **EventBus**: change notifications for display refresh
//!
//! # Example
//!
//! ```rust,no_run
//! use formzone_core::{Project, QcStrategy};
//! use formzone_ledger::Comment;
//!
//! # fn example() -> Result<(), formzone_core::FormzoneError> {
//! let project = Project::open("survey")?;
//! let (batch, _report) = project.open_batch("survey/batch01.csv")?;
//! batch.add_document("scan_0001.tif")?;
//!
//! let qc = QcStrategy::new(&project, &batch);
//! qc.index().toggle_tick("scan_0001.tif", "consent")?;
//! qc.escalate("scan_0001.tif", Comment::new(1, "consent", "signature missing"))?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod batch;
pub mod config;
pub mod error;
pub mod escalation;
pub mod events;
pub mod index;
pub mod project;
pub mod qc;
pub mod worker;

// Re-exports for convenience
pub use batch::{review_path_for, Batch, BatchOpenReport, Datasets, DuplicateResolution, EscalationOutcome};
pub use config::{ConfigFormat, ProjectConfig, CONFIG_STEM};
pub use error::{ErrorKind, FormzoneError, Result};
pub use escalation::{allowed_transitions, validate_transition, EscalationError, RecordState};
pub use events::{ChangeEvent, EventBus};
pub use index::IndexStrategy;
pub use project::{Project, PRESETS_FILE, SCHEMA_DIR};
pub use qc::{ChecklistEntry, QcStrategy};
pub use worker::{spawn_validation, validate_batch, BatchValidationReport, Progress, ValidationHandle};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Formzone Core
    pub use crate::{
        Batch, ChangeEvent, EscalationOutcome, FormzoneError, IndexStrategy, Project, ProjectConfig,
        QcStrategy, RecordState,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
