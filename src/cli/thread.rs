use std::path::PathBuf;

use clap::Parser;
use threadlog::{
    DisplayConfig, FieldValue, Record, ThreadNode, api, build_forest, domain::EntryKind,
    domain::diff::format_value, reconcile,
};
use tracing::instrument;

use super::terminal::{Colorize, is_narrow};

/// Deepest indentation level rendered; deeper replies line up with it.
const MAX_INDENT: usize = 6;

#[derive(Debug, Parser)]
#[command(about = "Reconcile a comment or answer listing into display order")]
pub struct Thread {
    /// JSON file holding the listing, as returned by the API
    file: PathBuf,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,

    /// Nest replies under their parents instead of grouping them
    #[arg(long)]
    nested: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

impl Thread {
    #[instrument(level = "debug", skip(self, config), fields(file = %self.file.display()))]
    pub fn run(self, config: &DisplayConfig) -> anyhow::Result<()> {
        let records = api::load_records(&self.file)?;

        match (self.output, self.nested) {
            (OutputFormat::Json, false) => {
                println!("{}", serde_json::to_string_pretty(&reconcile(&records))?);
            }
            (OutputFormat::Json, true) => {
                println!("{}", serde_json::to_string_pretty(&build_forest(&records))?);
            }
            (OutputFormat::Pretty, _) if records.is_empty() => {
                println!("No comments found.");
            }
            (OutputFormat::Pretty, false) => Self::output_grouped(config, &records),
            (OutputFormat::Pretty, true) => Self::output_nested(config, &records),
        }

        Ok(())
    }

    fn output_grouped(config: &DisplayConfig, records: &[Record]) {
        let reconciled = reconcile(records);

        for entry in &reconciled {
            print_record(
                config,
                entry.record,
                entry.depth,
                entry.kind == EntryKind::Placeholder,
            );
        }

        println!();
        println!(
            "{}",
            format!(
                "{} comments, {} replies",
                reconciled.visible_root_count(),
                reconciled.visible_reply_count()
            )
            .dim()
        );
    }

    fn output_nested(config: &DisplayConfig, records: &[Record]) {
        let forest = build_forest(records);

        print_forest(config, &forest);

        let visible: usize = forest.iter().map(ThreadNode::visible_count).sum();
        println!();
        println!(
            "{}",
            format!("{visible} visible in {} threads", forest.len()).dim()
        );
    }
}

fn print_forest(config: &DisplayConfig, forest: &[ThreadNode]) {
    let mut stack: Vec<(&ThreadNode, usize)> = forest.iter().rev().map(|node| (node, 0)).collect();

    while let Some((node, depth)) = stack.pop() {
        print_record(config, node.record, depth, node.placeholder);
        stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
    }
}

fn print_record(config: &DisplayConfig, record: &Record, depth: usize, placeholder: bool) {
    let indent = indent(depth);
    let marker = if depth > 0 { "↳ " } else { "" };

    if placeholder {
        println!("{indent}{marker}{}", config.deleted_placeholder.dim());
        return;
    }

    let created = record
        .created_at
        .as_deref()
        .map(|at| format_value(config, "createdAt", &FieldValue::from(at)))
        .unwrap_or_default();

    println!(
        "{indent}{marker}{} {} {}",
        format!("#{}", record.id).info(),
        record.author_name().strong(),
        created.dim()
    );
    for line in record.content.lines() {
        println!("{indent}  {line}");
    }
}

fn indent(depth: usize) -> String {
    let limit = if is_narrow() { 2 } else { MAX_INDENT };
    "  ".repeat(depth.min(limit))
}
