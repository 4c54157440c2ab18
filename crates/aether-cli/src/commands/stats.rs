use anyhow::{Context, Result};

use crate::output::format::format_stats;
use crate::output::OutputFormat;
use crate::workspace::{GlobalOpts, Workspace};

pub fn run(global: &GlobalOpts, format: OutputFormat) -> Result<()> {
    let ws = Workspace::open(global)?;
    let stats = ws.audit.stats().context("Failed to read audit log")?;
    let output = format_stats(&stats, &ws.home, format);
    print!("{output}");
    if matches!(format, OutputFormat::Json) {
        println!();
    }
    Ok(())
}
