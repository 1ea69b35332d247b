use std::path::{Path, PathBuf};

mod history;
mod terminal;
mod thread;

use anyhow::Context;
use clap::ArgAction;
use history::Diff;
use thread::Thread;
use threadlog::DisplayConfig;
use tracing::instrument;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Display settings file (TOML)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let config = load_config(self.config.as_deref())?;
        self.command.run(&config)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        // stdout carries the rendered output
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[instrument(level = "debug")]
fn load_config(path: Option<&Path>) -> anyhow::Result<DisplayConfig> {
    let Some(path) = path else {
        return Ok(DisplayConfig::default());
    };

    let config = DisplayConfig::load(path)
        .with_context(|| format!("failed to load display settings from {}", path.display()))?;
    tracing::info!(path = %path.display(), "loaded display settings");
    Ok(config)
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Reconcile a comment or answer listing into display order
    ///
    /// Live roots are listed first, then replies, then deleted comments that
    /// still have live replies.
    Thread(Thread),

    /// Show field-level changes of activity-log entries
    Diff(Diff),

    /// Print the effective display settings as TOML
    Config,
}

impl Command {
    fn run(self, config: &DisplayConfig) -> anyhow::Result<()> {
        match self {
            Self::Thread(command) => command.run(config)?,
            Self::Diff(command) => command.run(config)?,
            Self::Config => print!("{}", toml::to_string_pretty(config)?),
        }
        Ok(())
    }
}
