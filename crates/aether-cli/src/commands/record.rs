use aether_core::model::{LogResponse, LogType, NewLogEntry};
use anyhow::{Context, Result};
use clap::Args;

use crate::output::OutputFormat;
use crate::workspace::{GlobalOpts, Workspace};

#[derive(Args)]
pub struct RecordArgs {
    /// Entry type: workbench, image-analysis, image-caption, image-generate, logo-generate
    #[arg(long = "type", short = 't', value_parser = known_log_type)]
    pub log_type: LogType,

    /// What was asked or supplied
    #[arg(long, default_value = "")]
    pub prompt: String,

    /// What was produced
    #[arg(long)]
    pub response: String,

    /// Store --response as a JSON value instead of plain text
    #[arg(long)]
    pub json: bool,

    /// Attribute the entry to this user instead of the signed-in one
    #[arg(long)]
    pub user: Option<String>,
}

pub fn run(args: &RecordArgs, global: &GlobalOpts, format: OutputFormat) -> Result<()> {
    let ws = Workspace::open(global)?;
    let user = ws.resolve_user(args.user.as_deref())?;
    let response = if args.json {
        let value: serde_json::Value =
            serde_json::from_str(&args.response).context("--response is not valid JSON")?;
        LogResponse::from(value)
    } else {
        LogResponse::Text(args.response.clone())
    };
    let entry = NewLogEntry::new(args.log_type.clone(), args.prompt.as_str(), response).with_user(user);
    let logged = ws.audit.append(entry).context("Failed to append log entry")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&logged)?),
        OutputFormat::Text => println!("Recorded {} [{}]", logged.id.short(), logged.log_type),
    }
    Ok(())
}

/// Only the known kinds are accepted on the command line.
fn known_log_type(s: &str) -> Result<LogType, aether_core::CoreError> {
    s.parse()
}
