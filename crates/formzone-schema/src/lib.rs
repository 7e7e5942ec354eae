//! Formzone Field Schema
//!
//! Typed, zone-anchored field definitions for scanned survey forms, plus the
//! design-mode operations that are the only way to change them.
//!
//! # Overview
//!
//! - **Zone / Fiducial**: rectangles expressed relative to a page landmark
//! - **Field / FieldKind**: one finite kind set shared by every mode
//! - **ProjectSchema**: per-page ordered fields and the canonical column order
//! - **DesignStrategy**: structural edits, drawn-group conversion, radio grids
//! - **ModeStrategy**: capability table and render intents per mode
//!
//! # Example
//!
//! ```rust
//! use formzone_schema::{FieldKind, ProjectSchema, Zone};
//!
//! let mut schema = ProjectSchema::new();
//! schema.define_field(1, "consent", FieldKind::TickBox, Zone::new(10, 10, 12, 12), None).unwrap();
//! let colour = schema
//!     .define_field(1, "colour", FieldKind::RadioGroup, Zone::new(40, 10, 200, 20), None)
//!     .unwrap();
//! schema.define_field(1, "red", FieldKind::RadioButton, Zone::new(40, 10, 20, 20), Some(colour)).unwrap();
//!
//! assert_eq!(schema.resolve_column_order(), vec!["consent", "colour"]);
//! ```

#![warn(missing_docs)]

pub mod design;
pub mod error;
pub mod field;
pub mod grid;
pub mod mode;
pub mod persist;
pub mod schema;
pub mod value;
pub mod zone;

// Re-exports
pub use design::{CandidateSource, DesignStrategy, GroupCandidate, GroupRequest};
pub use error::{GridError, SchemaError};
pub use field::{Field, FieldId, FieldKind};
pub use grid::{GridOrientation, GroupLayout, RadioGrid};
pub use mode::{kind_colour, value_intent, Capabilities, Mode, ModeStrategy, RenderIntent, RenderStyle, Rgb};
pub use persist::{page_file, FieldRecord};
pub use schema::{ProjectSchema, SchemaChange, COMMENTS_COLUMN, DOCUMENT_KEY_COLUMN};
pub use value::{is_tick_token, TICKED};
pub use zone::{Fiducial, Zone};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for schema work
    pub use crate::{
        DesignStrategy, Field, FieldId, FieldKind, Mode, ModeStrategy, ProjectSchema, SchemaChange,
        SchemaError, Zone,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
