//! Formzone Record Store
//!
//! One row per scanned document, one column per schema field, plus the
//! document key and the serialized comment ledger.
//!
//! # Overview
//!
//! - **RecordStore**: value access by row and field name, radio-choice checks
//! - **Reconciliation**: rows from an older or headerless file are matched to
//!   the current schema by column name
//! - **Persistence**: CSV text replaced atomically (write new, rename over old)
//!
//! # Example
//!
//! ```rust
//! use formzone_records::RecordStore;
//! use formzone_schema::{FieldKind, ProjectSchema, Zone};
//!
//! let mut schema = ProjectSchema::new();
//! schema.define_field(1, "name", FieldKind::TextField, Zone::new(0, 0, 80, 12), None).unwrap();
//!
//! let (mut store, _report) = RecordStore::open(&schema, None).unwrap();
//! let row = store.add_document("scan_001.tif").unwrap();
//! store.set_value(row, "name", "Ann").unwrap();
//! assert_eq!(store.get_value(row, "name").unwrap(), "Ann");
//! ```

#![warn(missing_docs)]

pub mod columns;
pub mod error;
pub mod persist;
pub mod record;
pub mod store;

// Re-exports
pub use columns::{detect_header, ColumnSpec};
pub use error::StoreError;
pub use persist::{read_rows, write_atomic, write_rows};
pub use record::DocumentRecord;
pub use store::{Completion, DroppedValue, ReconcileReport, RecordStore};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for record access
    pub use crate::{ColumnSpec, DocumentRecord, ReconcileReport, RecordStore, StoreError};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
