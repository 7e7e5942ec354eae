//! Formzone Comment Ledger
//!
//! Ordered, de-duplicated comments attached to one document record, stored
//! in a single delimited string.
//!
//! # Overview
//!
//! - **Comment**: `(page, field, message)` plus an escalation flag
//! - **Ledger**: append / edit / remove, equality by the full triple
//! - **Encoding**: `P<page>: <field>: <message>` joined by ` | `
//!
//! # Example
//!
//! ```rust
//! use formzone_ledger::{Comment, Ledger};
//!
//! let mut ledger = Ledger::new();
//! ledger.append(Comment::new(1, "q1", "illegible"));
//! ledger.append(Comment::new(1, "q1", "illegible"));
//! assert_eq!(ledger.len(), 1);
//!
//! let text = ledger.serialize();
//! assert_eq!(text, "P1: q1: illegible");
//! assert_eq!(Ledger::parse(&text).unwrap(), ledger);
//! ```

#![warn(missing_docs)]

pub mod codec;
pub mod comment;
pub mod error;
pub mod ledger;

// Re-exports
pub use comment::Comment;
pub use error::LedgerError;
pub use ledger::Ledger;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for ledger operations
    pub use crate::{Comment, Ledger, LedgerError};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
