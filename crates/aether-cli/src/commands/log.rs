use anyhow::{Context, Result};
use clap::Args;

use crate::output::format::format_log_list;
use crate::output::OutputFormat;
use crate::workspace::{GlobalOpts, Workspace};

#[derive(Args)]
pub struct LogArgs {
    /// Only entries whose JSON contains this text (case-insensitive)
    #[arg(long, short)]
    pub filter: Option<String>,

    /// Maximum number of entries (0 for all)
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,

    /// Include each entry's response
    #[arg(long)]
    pub full: bool,
}

pub fn run(args: &LogArgs, global: &GlobalOpts, format: OutputFormat) -> Result<()> {
    let ws = Workspace::open(global)?;
    let mut entries = ws
        .audit
        .list(args.filter.as_deref())
        .context("Failed to read audit log")?;
    if args.limit > 0 {
        entries.truncate(args.limit);
    }

    let output = format_log_list(&entries, args.full, format);
    print!("{output}");
    if matches!(format, OutputFormat::Json) {
        println!();
    }
    Ok(())
}
