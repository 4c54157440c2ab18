use anyhow::{Context, Result};
use clap::Args;

use crate::workspace::{GlobalOpts, Workspace};

#[derive(Args)]
pub struct ClearArgs {
    /// Skip confirmation prompt
    #[arg(long, short)]
    pub yes: bool,
}

pub fn run(args: &ClearArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let count = ws.audit.list(None).map(|e| e.len()).unwrap_or(0);

    if !args.yes {
        println!("{count} log entr(ies) would be deleted.");
        eprintln!("Use --yes to confirm deletion.");
        return Ok(());
    }

    ws.audit.clear().context("Failed to clear audit log")?;
    println!("Cleared {count} log entr(ies).");
    Ok(())
}
