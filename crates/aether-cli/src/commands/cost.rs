use anyhow::{Context, Result};
use clap::Args;

use crate::output::format::format_cost;
use crate::output::OutputFormat;
use crate::workspace::{GlobalOpts, Workspace};

#[derive(Args)]
pub struct CostArgs {
    /// Reset the ledger to zero
    #[arg(long)]
    pub reset: bool,
}

pub fn run(args: &CostArgs, global: &GlobalOpts, format: OutputFormat) -> Result<()> {
    let ws = Workspace::open(global)?;
    if args.reset {
        ws.audit.reset_ledger().context("Failed to reset cost ledger")?;
    }
    let total = ws.audit.ledger_total().context("Failed to read cost ledger")?;

    match format {
        OutputFormat::Json => {
            let out = serde_json::json!({
                "cost_total": total,
                "rate_per_token": ws.config.rate_per_token,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => println!("Total cost: {}", format_cost(total)),
    }
    Ok(())
}
