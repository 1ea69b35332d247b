//! Decoding of admin API responses.
//!
//! Every endpoint answers with the same envelope,
//! `{ status, code, message, data }`, where `data` is a single object, an
//! array, or a page `{ content, page }`. The engines in [`crate::domain`]
//! never see the envelope; this module unwraps it.

use std::{
    fmt, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::{ChangeKind, DiffField, DisplayConfig, Record, RecordId, Snapshot, diff_with};

/// Errors raised while loading API payloads.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path of the payload file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The payload is not valid JSON or does not have the expected shape.
    #[error("failed to decode payload: {0}")]
    Json(#[from] serde_json::Error),
    /// The envelope reports a failed request.
    #[error("request failed with status {status}: {message}")]
    Failed {
        /// Status reported by the envelope.
        status: Status,
        /// Message reported by the envelope.
        message: String,
    },
}

/// The `status` of an envelope: an HTTP code or a textual outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Status {
    /// Numeric HTTP status.
    Code(u16),
    /// Textual status such as `"OK"` or `"ERROR"`.
    Text(String),
}

impl Status {
    /// Whether the status reports a failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        match self {
            Self::Code(code) => *code >= 400,
            Self::Text(text) => {
                let text = text.to_ascii_uppercase();
                text == "ERROR" || text == "FAIL" || text == "FAILURE"
            }
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{code}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// The response envelope shared by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Outcome of the request.
    #[serde(default)]
    pub status: Option<Status>,
    /// Application-specific result code, passed through opaquely.
    #[serde(default)]
    pub code: Option<Value>,
    /// Human-readable message.
    #[serde(default)]
    pub message: Option<String>,
    /// The payload. Failed requests usually carry `null`.
    pub data: Option<Payload<T>>,
}

impl<T> ApiResponse<T> {
    /// Unwraps the payload, rejecting envelopes that report a failure.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Failed`] if the status is an error status.
    pub fn into_items(self) -> Result<Vec<T>, LoadError> {
        match self.status {
            Some(status) if status.is_error() => Err(LoadError::Failed {
                status,
                message: self.message.unwrap_or_default(),
            }),
            _ => Ok(self.data.map_or_else(Vec::new, Payload::into_items)),
        }
    }
}

/// The `data` member of an envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload<T> {
    /// A page of results.
    Paged {
        /// Items on this page.
        content: Vec<T>,
        /// Paging metadata.
        page: PageInfo,
    },
    /// A plain list.
    Many(Vec<T>),
    /// A single item.
    One(T),
}

impl<T> Payload<T> {
    /// Flattens the payload into a list.
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Paged { content, .. } => content,
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }
}

/// Paging metadata of a [`Payload::Paged`] response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageInfo {
    /// Page size.
    pub size: u64,
    /// Zero-based page number.
    pub number: u64,
    /// Number of items across all pages.
    pub total_elements: u64,
    /// Number of pages.
    pub total_pages: u64,
}

/// One activity-log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Identifier of the log entry.
    #[serde(default)]
    pub id: Option<RecordId>,
    /// The operation that was logged.
    #[serde(alias = "historyType", alias = "action")]
    pub change_kind: ChangeKind,
    /// Kind of entity the entry refers to, e.g. `POST` or `PROJECT`.
    #[serde(default)]
    pub entity_type: Option<String>,
    /// Snapshot before the change.
    #[serde(default)]
    pub before: Option<Snapshot>,
    /// Snapshot after the change. For deletions, the last known state.
    #[serde(default)]
    pub after: Option<Snapshot>,
    /// When the change happened.
    #[serde(default)]
    pub changed_at: Option<String>,
    /// Who made the change.
    #[serde(default)]
    pub changed_by: Option<String>,
}

impl HistoryEntry {
    /// Diffs the entry's snapshots. A missing side counts as empty.
    #[must_use]
    pub fn diff(&self, config: &DisplayConfig) -> Vec<DiffField> {
        let empty = Snapshot::new();
        diff_with(
            config,
            self.before.as_ref().unwrap_or(&empty),
            self.after.as_ref().unwrap_or(&empty),
            self.change_kind,
        )
    }
}

/// Parses a JSON document into its items.
///
/// The document is either a full envelope (an object with a `data` member)
/// or a bare payload as it would appear under `data`.
///
/// # Errors
///
/// Returns an error if the JSON does not decode into `T`, or if the envelope
/// reports a failed request.
pub fn parse_items<T: DeserializeOwned>(json: &str) -> Result<Vec<T>, LoadError> {
    let document: Value = serde_json::from_str(json)?;
    let is_envelope = document
        .as_object()
        .is_some_and(|object| object.contains_key("data"));

    if is_envelope {
        serde_json::from_value::<ApiResponse<T>>(document)?.into_items()
    } else {
        Ok(serde_json::from_value::<Payload<T>>(document)?.into_items())
    }
}

/// Loads the items of a JSON document from a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or its content cannot be
/// decoded; see [`parse_items`].
#[instrument(level = "debug")]
pub fn load_items<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, LoadError> {
    let json = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let items = parse_items(&json)?;
    debug!(items = items.len(), "loaded payload");
    Ok(items)
}

/// Loads comment, answer or question records from a file.
///
/// # Errors
///
/// See [`load_items`].
pub fn load_records(path: &Path) -> Result<Vec<Record>, LoadError> {
    load_items(path)
}

/// Loads activity-log entries from a file.
///
/// # Errors
///
/// See [`load_items`].
pub fn load_history(path: &Path) -> Result<Vec<HistoryEntry>, LoadError> {
    load_items(path)
}
