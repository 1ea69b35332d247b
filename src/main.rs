//! `tlog`: inspect comment threads and activity-log diffs in admin API
//! payloads.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
