//! Comment threads and activity-log diffs for project-management admin views.
//!
//! Two pure engines are exposed: [`reconcile`] turns a flat, soft-deleted
//! comment or answer listing into display order, and [`diff`] turns the
//! before/after snapshots of an activity-log entry into labelled, formatted
//! fields.

pub mod domain;
pub use domain::{
    ChangeKind, DiffField, DisplayConfig, FieldValue, Reconciled, Record, RecordId, Snapshot,
    ThreadEntry, ThreadNode, build_forest, diff, diff_with, reconcile,
};

/// Decoding of admin API responses.
pub mod api;
pub use api::{ApiResponse, HistoryEntry, LoadError, Payload};
