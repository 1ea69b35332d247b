//! Field-level diffs of audit-log snapshots.
//!
//! An activity-log entry stores a `before` and an `after` snapshot of the
//! changed entity. [`diff`] turns the pair into one [`DiffField`] per visible
//! key, labelled and formatted for display, with change detection that
//! ignores the fields every edit carries over.

use std::{fmt, sync::LazyLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

mod format;
mod vocabulary;

pub use format::{EMPTY_DISPLAY, REDACTED_DISPLAY, format_value, label_for};
pub use vocabulary::ENUM_KEYS;

use crate::domain::{DisplayConfig, FieldValue, Snapshot};

/// The audit-log operation that produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    /// The entity was created.
    #[serde(alias = "CREATE")]
    Created,
    /// The entity was edited.
    #[serde(alias = "UPDATE")]
    Updated,
    /// The entity was deleted.
    #[serde(alias = "DELETE")]
    Deleted,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "CREATED",
            Self::Updated => "UPDATED",
            Self::Deleted => "DELETED",
        })
    }
}

/// Keys that are carried over unchanged by every edit.
///
/// Their values never count as changed, even when the raw values differ.
pub const UNCHANGING_KEYS: [&str; 8] = [
    "authorName",
    "authorRole",
    "authorId",
    "authorIp",
    "createdAt",
    "id",
    "projectId",
    "projectStepId",
];

/// Whether a key is internal bookkeeping that is never displayed.
#[must_use]
pub fn is_system_key(key: &str) -> bool {
    key.starts_with('_') || matches!(key, "delete" | "deletedAt" | "updatedAt")
}

/// Whether a key belongs to [`UNCHANGING_KEYS`].
#[must_use]
pub fn is_unchanging_key(key: &str) -> bool {
    UNCHANGING_KEYS.contains(&key)
}

/// One field of a diff, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffField {
    /// Field name as stored.
    pub key: String,
    /// Display label of the field.
    pub label: String,
    /// Value before the change. `Null` when absent.
    pub before: FieldValue,
    /// Value after the change. `Null` when absent.
    pub after: FieldValue,
    /// Formatted `before`.
    pub before_display: String,
    /// Formatted `after`.
    pub after_display: String,
    /// The formatted value to show for the field.
    pub display: String,
    /// Whether the field changed.
    pub is_changed: bool,
    /// Whether the key is one of [`UNCHANGING_KEYS`].
    pub is_tracked_as_unchanging: bool,
}

impl DiffField {
    /// A display-only field, as produced for created and deleted entities.
    fn snapshot(config: &DisplayConfig, key: &str, value: &FieldValue) -> Self {
        let display = format_value(config, key, value);
        Self {
            key: key.to_string(),
            label: label_for(config, key).to_string(),
            before: FieldValue::Null,
            after: value.clone(),
            before_display: EMPTY_DISPLAY.to_string(),
            after_display: display.clone(),
            display,
            is_changed: false,
            is_tracked_as_unchanging: is_unchanging_key(key),
        }
    }

    /// A compared field, as produced for edited entities.
    fn compare(
        config: &DisplayConfig,
        key: &str,
        before: Option<&FieldValue>,
        after: Option<&FieldValue>,
    ) -> Self {
        let before = before.cloned().unwrap_or_default();
        let after = after.cloned().unwrap_or_default();
        let before_display = format_value(config, key, &before);
        let after_display = format_value(config, key, &after);
        let unchanging = is_unchanging_key(key);

        let (is_changed, display) = if unchanging {
            // edit payloads often omit carry-over fields
            let shown = if after.is_missing() && !before.is_missing() {
                &before_display
            } else {
                &after_display
            };
            (false, shown.clone())
        } else {
            (!before.same_as(&after), after_display.clone())
        };

        Self {
            key: key.to_string(),
            label: label_for(config, key).to_string(),
            before,
            after,
            before_display,
            after_display,
            display,
            is_changed,
            is_tracked_as_unchanging: unchanging,
        }
    }
}

static DEFAULT_CONFIG: LazyLock<DisplayConfig> = LazyLock::new(DisplayConfig::default);

/// Diffs two snapshots using the default display settings.
///
/// See [`diff_with`].
#[must_use]
pub fn diff(before: &Snapshot, after: &Snapshot, kind: ChangeKind) -> Vec<DiffField> {
    diff_with(&DEFAULT_CONFIG, before, after, kind)
}

/// Diffs two snapshots.
///
/// - [`ChangeKind::Created`] and [`ChangeKind::Deleted`] list the fields of
///   `after`, none of them changed. The history store keeps the last state of
///   a deleted entity under `after`, so deletions are sourced from it too.
/// - [`ChangeKind::Updated`] lists the union of both key sets, `after`'s keys
///   first, and flags the fields whose values differ.
///
/// System keys (see [`is_system_key`]) are never listed.
#[must_use]
#[instrument(level = "debug", skip_all, fields(%kind))]
pub fn diff_with(
    config: &DisplayConfig,
    before: &Snapshot,
    after: &Snapshot,
    kind: ChangeKind,
) -> Vec<DiffField> {
    let fields: Vec<DiffField> = match kind {
        ChangeKind::Created | ChangeKind::Deleted => after
            .iter()
            .filter(|(key, _)| !is_system_key(key))
            .map(|(key, value)| DiffField::snapshot(config, key, value))
            .collect(),
        ChangeKind::Updated => after
            .keys()
            .chain(before.keys().filter(|key| !after.contains_key(key)))
            .filter(|key| !is_system_key(key))
            .map(|key| DiffField::compare(config, key, before.get(key), after.get(key)))
            .collect(),
    };

    debug!(
        fields = fields.len(),
        changed = fields.iter().filter(|field| field.is_changed).count(),
        "diffed snapshots"
    );
    fields
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn snapshot(value: serde_json::Value) -> Snapshot {
        serde_json::from_value(value).unwrap()
    }

    fn field<'a>(fields: &'a [DiffField], key: &str) -> &'a DiffField {
        fields
            .iter()
            .find(|field| field.key == key)
            .unwrap_or_else(|| panic!("no field {key}"))
    }

    #[test]
    fn created_lists_after_fields_unchanged() {
        let after = snapshot(json!({"status": "ACTIVE", "priority": "HIGH", "password": "x"}));

        let fields = diff(&Snapshot::new(), &after, ChangeKind::Created);

        let keys: Vec<&str> = fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, ["status", "priority", "password"]);
        assert_eq!(field(&fields, "status").display, "활성");
        assert_eq!(field(&fields, "priority").display, "높음");
        assert_eq!(field(&fields, "password").display, "x");
        assert!(fields.iter().all(|f| !f.is_changed));
    }

    #[test]
    fn created_ignores_before() {
        let before = snapshot(json!({"title": "old"}));
        let after = snapshot(json!({"content": "hello"}));

        let fields = diff(&before, &after, ChangeKind::Created);

        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].key, "content");
        assert_eq!(fields[0].label, "내용");
    }

    #[test]
    fn deleted_is_sourced_from_after() {
        let before = snapshot(json!({}));
        let after = snapshot(json!({"title": "Removed post", "authorName": "Kim"}));

        let fields = diff(&before, &after, ChangeKind::Deleted);

        assert_eq!(fields.len(), 2);
        assert_eq!(field(&fields, "title").display, "Removed post");
        assert!(fields.iter().all(|f| !f.is_changed));
    }

    #[test]
    fn system_keys_are_never_listed() {
        let value = json!({
            "_id": "abc",
            "_class": "Post",
            "delete": false,
            "deletedAt": null,
            "updatedAt": "2024-01-01T00:00:00",
            "title": "t"
        });
        let before = snapshot(value.clone());
        let mut changed = value;
        changed["title"] = json!("u");
        let after = snapshot(changed);

        for kind in [ChangeKind::Created, ChangeKind::Updated, ChangeKind::Deleted] {
            let keys: Vec<String> = diff(&before, &after, kind)
                .into_iter()
                .map(|f| f.key)
                .collect();
            assert_eq!(keys, ["title"], "{kind}");
        }
    }

    #[test]
    fn unchanging_keys_never_change() {
        let before = snapshot(json!({"authorName": "Kim", "projectId": 1, "title": "a"}));
        let after = snapshot(json!({"authorName": "Lee", "projectId": 2, "title": "a"}));

        let fields = diff(&before, &after, ChangeKind::Updated);

        let author = field(&fields, "authorName");
        assert!(!author.is_changed);
        assert!(author.is_tracked_as_unchanging);
        assert_eq!(author.display, "Lee");
        assert!(!field(&fields, "projectId").is_changed);
        assert!(!field(&fields, "title").is_changed);
    }

    #[test]
    fn unchanging_keys_fall_back_to_before() {
        let before = snapshot(json!({"authorName": "Kim", "createdAt": "2024-01-15T15:30:00"}));
        let after = snapshot(json!({"authorName": "", "title": "new"}));

        let fields = diff(&before, &after, ChangeKind::Updated);

        assert_eq!(field(&fields, "authorName").display, "Kim");
        assert_eq!(
            field(&fields, "createdAt").display,
            "2024. 1. 15. 오후 3:30:00"
        );
    }

    #[test]
    fn updated_flags_changed_fields() {
        let before = snapshot(json!({"title": "a", "priority": "LOW", "budget": 1000}));
        let after = snapshot(json!({"title": "b", "priority": "LOW", "budget": 1000.0}));

        let fields = diff(&before, &after, ChangeKind::Updated);

        let title = field(&fields, "title");
        assert!(title.is_changed);
        assert_eq!(title.before_display, "a");
        assert_eq!(title.after_display, "b");
        assert_eq!(title.display, "b");
        assert!(!field(&fields, "priority").is_changed);
        assert!(!field(&fields, "budget").is_changed);
    }

    #[test]
    fn updated_lists_union_with_after_keys_first() {
        let before = snapshot(json!({"removed": "x", "title": "a"}));
        let after = snapshot(json!({"title": "a", "added": "y"}));

        let fields = diff(&before, &after, ChangeKind::Updated);

        let keys: Vec<&str> = fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, ["title", "added", "removed"]);
        assert!(field(&fields, "added").is_changed);

        let removed = field(&fields, "removed");
        assert!(removed.is_changed);
        assert_eq!(removed.after, FieldValue::Null);
        assert_eq!(removed.display, EMPTY_DISPLAY);
    }

    #[test]
    fn type_change_between_text_and_number_is_a_change() {
        let before = snapshot(json!({"code": "1"}));
        let after = snapshot(json!({"code": 1}));

        let fields = diff(&before, &after, ChangeKind::Updated);

        assert!(field(&fields, "code").is_changed);
    }

    #[test]
    fn attachment_changes_compare_structurally() {
        let before = snapshot(json!({"files": [{"fileName": "a.png", "url": "https://a"}]}));
        let same = snapshot(json!({"files": [{"fileName": "a.png", "url": "https://a"}]}));
        let other = snapshot(json!({"files": [{"fileName": "b.png", "url": "https://b"}]}));

        assert!(!diff(&before, &same, ChangeKind::Updated)[0].is_changed);
        assert!(diff(&before, &other, ChangeKind::Updated)[0].is_changed);
    }

    #[test]
    fn custom_config_redacts_passwords() {
        let mut config = DisplayConfig::default();
        config.redact_keys.insert("password".to_string());
        let after = snapshot(json!({"password": "secret"}));

        let fields = diff_with(&config, &Snapshot::new(), &after, ChangeKind::Created);

        assert_eq!(fields[0].display, REDACTED_DISPLAY);
    }

    #[test]
    fn change_kind_accepts_short_forms() {
        let kind: ChangeKind = serde_json::from_value(json!("UPDATE")).unwrap();
        assert_eq!(kind, ChangeKind::Updated);
        let kind: ChangeKind = serde_json::from_value(json!("DELETED")).unwrap();
        assert_eq!(kind, ChangeKind::Deleted);
    }
}
