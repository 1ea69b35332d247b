use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a [`Record`].
///
/// The admin API emits numeric identifiers for some entities and string
/// identifiers for others. Both decode into the same canonical string form, so
/// `1` and `"1"` refer to the same record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawId", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Creates an identifier from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i32> for RecordId {
    fn from(id: i32) -> Self {
        Self(id.to_string())
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Signed(i64),
    Unsigned(u64),
    Text(String),
}

impl From<RawId> for RecordId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Signed(n) => Self(n.to_string()),
            RawId::Unsigned(n) => Self(n.to_string()),
            RawId::Text(s) => Self(s),
        }
    }
}

/// The author of a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Identifier of the author, when the API includes one.
    #[serde(default)]
    pub id: Option<RecordId>,
    /// Display name of the author.
    #[serde(default)]
    pub name: String,
}

/// A comment, answer or question as returned by the admin API.
///
/// Records are plain value objects. Nothing in this crate mutates a record
/// after it has been decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawRecord", rename_all = "camelCase")]
pub struct Record {
    /// Unique identifier within a listing.
    pub id: RecordId,
    /// The record this one replies to. `None` for a root.
    pub parent_id: Option<RecordId>,
    /// Explicit soft-delete flag.
    #[serde(rename = "isDeleted")]
    pub deleted: bool,
    /// Soft-delete timestamp, if the record has been removed.
    pub deleted_at: Option<String>,
    /// Lifecycle status. `"DELETED"` marks a soft-deleted record.
    pub status: Option<String>,
    /// Creation timestamp as sent by the API.
    pub created_at: Option<String>,
    /// Display text.
    pub content: String,
    /// Who wrote the record.
    pub author: Option<Author>,
}

/// Status sentinel the API uses for soft-deleted records.
pub const DELETED_STATUS: &str = "DELETED";

impl Record {
    /// Creates a live root record with no content.
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
            deleted: false,
            deleted_at: None,
            status: None,
            created_at: None,
            content: String::new(),
            author: None,
        }
    }

    /// Sets the parent reference.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<RecordId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    /// Sets the display text.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Marks the record as soft-deleted through the explicit flag.
    #[must_use]
    pub const fn soft_deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    /// Whether any of the soft-delete signals is present.
    ///
    /// The API is inconsistent about how it marks removed records: an
    /// `isDeleted` flag, a `deletedAt` timestamp, and a `DELETED` status are
    /// all equivalent.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted || self.deleted_at.is_some() || self.status.as_deref() == Some(DELETED_STATUS)
    }

    /// The author's display name, or an empty string.
    #[must_use]
    pub fn author_name(&self) -> &str {
        self.author.as_ref().map_or("", |author| author.name.as_str())
    }
}

/// Wire shape of a record.
///
/// Accepts both the nested `author` object and the flat `authorId` /
/// `authorName` pair, and tolerates nulls where the API sends them.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    id: RecordId,
    #[serde(default)]
    parent_id: Option<RecordId>,
    #[serde(default)]
    is_deleted: Option<bool>,
    #[serde(default)]
    delete: Option<bool>,
    #[serde(default)]
    deleted_at: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    author: Option<Author>,
    #[serde(default)]
    author_id: Option<RecordId>,
    #[serde(default)]
    author_name: Option<String>,
}

impl From<RawRecord> for Record {
    fn from(raw: RawRecord) -> Self {
        let author = raw.author.or_else(|| {
            (raw.author_id.is_some() || raw.author_name.is_some()).then(|| Author {
                id: raw.author_id,
                name: raw.author_name.unwrap_or_default(),
            })
        });

        Self {
            id: raw.id,
            // an empty string is how some endpoints spell "no parent"
            parent_id: raw.parent_id.filter(|parent| !parent.as_str().is_empty()),
            deleted: raw.is_deleted.unwrap_or(false) || raw.delete.unwrap_or(false),
            deleted_at: raw.deleted_at,
            status: raw.status,
            created_at: raw.created_at,
            content: raw.content.unwrap_or_default(),
            author,
        }
    }
}
