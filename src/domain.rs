//! Domain models and the two display engines.
//!
//! This module contains the record and snapshot types decoded from the admin
//! API, the thread reconciler, the field diff engine, and the display
//! configuration they share.

/// Comment, answer and question records.
pub mod record;
pub use record::{Author, Record, RecordId};

/// Thread reconciliation for comment and answer listings.
pub mod thread;
pub use thread::{EntryKind, Reconciled, ThreadEntry, ThreadNode, build_forest, reconcile};

/// Typed snapshot values.
pub mod value;
pub use value::{FieldValue, Snapshot};

pub mod diff;
pub use diff::{ChangeKind, DiffField, diff, diff_with};

mod config;
pub use config::{ConfigError, DisplayConfig};
