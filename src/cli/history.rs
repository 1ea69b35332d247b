use std::path::PathBuf;

use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;
use threadlog::{
    ChangeKind, DiffField, DisplayConfig, FieldValue, HistoryEntry, RecordId, api,
    domain::diff::format_value,
};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Show field-level changes of activity-log entries")]
pub struct Diff {
    /// JSON file holding activity-log entries, as returned by the API
    file: PathBuf,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,

    /// Only list fields that changed (edits only)
    #[arg(long)]
    changed_only: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

/// The diff of one log entry, as printed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EntryDiff<'a> {
    id: Option<&'a RecordId>,
    change_kind: ChangeKind,
    entity_type: Option<&'a str>,
    changed_at: Option<&'a str>,
    changed_by: Option<&'a str>,
    fields: Vec<DiffField>,
}

impl<'a> EntryDiff<'a> {
    fn new(entry: &'a HistoryEntry, config: &DisplayConfig, changed_only: bool) -> Self {
        let mut fields = entry.diff(config);
        if changed_only {
            fields.retain(|field| field.is_changed);
        }

        Self {
            id: entry.id.as_ref(),
            change_kind: entry.change_kind,
            entity_type: entry.entity_type.as_deref(),
            changed_at: entry.changed_at.as_deref(),
            changed_by: entry.changed_by.as_deref(),
            fields,
        }
    }
}

impl Diff {
    #[instrument(level = "debug", skip(self, config), fields(file = %self.file.display()))]
    pub fn run(self, config: &DisplayConfig) -> anyhow::Result<()> {
        let entries = api::load_history(&self.file)?;
        let changed_only = self.changed_only;

        let diffs: Vec<EntryDiff> = entries
            .par_iter()
            .map(|entry| EntryDiff::new(entry, config, changed_only))
            .collect();

        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&diffs)?),
            OutputFormat::Pretty if diffs.is_empty() => println!("No activity found."),
            OutputFormat::Pretty => {
                for diff in &diffs {
                    print_entry(config, diff);
                }
            }
        }

        Ok(())
    }
}

fn print_entry(config: &DisplayConfig, diff: &EntryDiff) {
    let mut header = format!("[{}]", diff.change_kind).strong();
    if let Some(entity) = diff.entity_type {
        header.push(' ');
        header.push_str(entity);
    }
    if let Some(id) = diff.id {
        header.push(' ');
        header.push_str(&format!("#{id}").info());
    }
    if let Some(at) = diff.changed_at {
        let at = format_value(config, "changedAt", &FieldValue::from(at));
        header.push_str(&format!(" · {at}").dim());
    }
    if let Some(by) = diff.changed_by {
        header.push_str(&format!(" · {by}").dim());
    }
    println!("{header}");

    if diff.fields.is_empty() {
        println!("  {}", "(no fields)".dim());
    }
    for field in &diff.fields {
        if field.is_changed {
            println!(
                "  {}: {} → {}",
                field.label,
                field.before_display.dim(),
                field.after_display.changed()
            );
        } else if field.is_tracked_as_unchanging {
            println!("  {}", format!("{}: {}", field.label, field.display).dim());
        } else {
            println!("  {}: {}", field.label, field.display);
        }
    }
    println!();
}
