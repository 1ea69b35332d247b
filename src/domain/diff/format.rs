//! Display formatting for snapshot values.
//!
//! Every function here is total: values that cannot be formatted the rich way
//! fall back to their raw string form.

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike,
};
use serde_json::Number;

use super::vocabulary;
use crate::domain::{DisplayConfig, FieldValue};

/// Shown for missing values and for values with no displayable form.
pub const EMPTY_DISPLAY: &str = "-";

/// Shown in place of redacted values.
pub const REDACTED_DISPLAY: &str = "********";

/// Key fragments that mark a timestamp field.
const DATE_KEY_FRAGMENTS: [&str; 4] = ["createdAt", "changedAt", "updatedAt", "deletedAt"];

/// Naive layouts the API uses for local timestamps, tried in order.
const NAIVE_LAYOUTS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Returns the display label of a field.
///
/// Configured labels win over the built-in vocabulary; unknown keys are shown
/// as-is.
#[must_use]
pub fn label_for<'a>(config: &'a DisplayConfig, key: &'a str) -> &'a str {
    config
        .field_label(key)
        .or_else(|| vocabulary::field_label(key))
        .unwrap_or(key)
}

/// Formats a field value for display.
///
/// The rules are checked in a fixed order: missing values, redaction, enum
/// labels, files, lists, links, other objects, timestamps, booleans, numbers,
/// and finally the raw text.
#[must_use]
pub fn format_value(config: &DisplayConfig, key: &str, value: &FieldValue) -> String {
    match value {
        FieldValue::Null => return EMPTY_DISPLAY.to_string(),
        FieldValue::Text(text) if text == "empty" => return EMPTY_DISPLAY.to_string(),
        _ => {}
    }

    if config.is_redacted(key) {
        return REDACTED_DISPLAY.to_string();
    }

    match value {
        FieldValue::Text(text) if vocabulary::is_enum_key(key) => config
            .enum_label(key, text)
            .or_else(|| vocabulary::enum_label(key, text))
            .unwrap_or(text)
            .to_string(),
        FieldValue::File { file_name, .. } => file_name.clone(),
        FieldValue::List(items) => format_list(items),
        FieldValue::Link { url } => url.clone(),
        FieldValue::Object(_) | FieldValue::Null => EMPTY_DISPLAY.to_string(),
        FieldValue::Text(text) if is_date_key(key) => {
            parse_timestamp(text, config.utc_offset()).map_or_else(|| text.clone(), korean_datetime)
        }
        FieldValue::Number(number) if is_date_key(key) => number
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map_or_else(
                || number.to_string(),
                |utc| korean_datetime(utc.with_timezone(&config.utc_offset())),
            ),
        FieldValue::Bool(true) => config.yes_label.clone(),
        FieldValue::Bool(false) => config.no_label.clone(),
        FieldValue::Number(number) => format_number(number),
        FieldValue::Text(text) => text.clone(),
    }
}

fn is_date_key(key: &str) -> bool {
    DATE_KEY_FRAGMENTS
        .iter()
        .any(|fragment| key.contains(fragment))
}

/// Lists are shown by their first element's shape: links (or files with a
/// url) as their urls, text as itself, files by the first file's name.
fn format_list(items: &[FieldValue]) -> String {
    let joined = |parts: Vec<&str>| {
        if parts.is_empty() {
            EMPTY_DISPLAY.to_string()
        } else {
            parts.join(", ")
        }
    };

    match items.first() {
        None => EMPTY_DISPLAY.to_string(),
        Some(FieldValue::Link { .. } | FieldValue::File { url: Some(_), .. }) => joined(
            items
                .iter()
                .filter_map(|item| match item {
                    FieldValue::Link { url } | FieldValue::File { url: Some(url), .. } => {
                        Some(url.as_str())
                    }
                    _ => None,
                })
                .collect(),
        ),
        Some(FieldValue::Text(_)) => joined(
            items
                .iter()
                .filter_map(|item| match item {
                    FieldValue::Text(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
        ),
        Some(FieldValue::File { file_name, .. }) => file_name.clone(),
        Some(_) => EMPTY_DISPLAY.to_string(),
    }
}

/// Parses the timestamp shapes the API emits.
///
/// Offset-qualified timestamps are converted to `offset`; naive timestamps
/// are taken to already be local to it; bare dates are UTC midnight.
fn parse_timestamp(text: &str, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&offset));
    }

    if let Some(naive) = NAIVE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(text, layout).ok())
    {
        return offset.from_local_datetime(&naive).single();
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc().with_timezone(&offset))
}

/// Renders a timestamp the way the Korean locale does, e.g.
/// `2024. 1. 15. 오후 3:30:00`.
fn korean_datetime(at: DateTime<FixedOffset>) -> String {
    let (is_pm, hour) = at.hour12();
    format!(
        "{}. {}. {}. {} {}:{:02}:{:02}",
        at.year(),
        at.month(),
        at.day(),
        if is_pm { "오후" } else { "오전" },
        hour,
        at.minute(),
        at.second()
    )
}

/// Formats a number with thousands separators and at most three fraction
/// digits.
fn format_number(number: &Number) -> String {
    if let Some(n) = number.as_i64() {
        return signed(n < 0, &group_digits(&n.unsigned_abs().to_string()), "");
    }
    if let Some(n) = number.as_u64() {
        return group_digits(&n.to_string());
    }

    match number.as_f64() {
        Some(n) if n.is_finite() => {
            let rounded = format!("{:.3}", n.abs());
            let (integer, fraction) = rounded.split_once('.').unwrap_or((&rounded, ""));
            let fraction = fraction.trim_end_matches('0');
            let is_zero = integer == "0" && fraction.is_empty();
            signed(n < 0.0 && !is_zero, &group_digits(integer), fraction)
        }
        _ => number.to_string(),
    }
}

fn signed(negative: bool, integer: &str, fraction: &str) -> String {
    let sign = if negative { "-" } else { "" };
    if fraction.is_empty() {
        format!("{sign}{integer}")
    } else {
        format!("{sign}{integer}.{fraction}")
    }
}

fn group_digits(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}
