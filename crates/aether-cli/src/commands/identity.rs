use aether_core::model::Identity;
use aether_core::storage::{clear_identity, load_identity, save_identity};
use anyhow::{Context, Result};
use clap::Args;

use crate::output::format::GUEST;
use crate::output::OutputFormat;
use crate::workspace::{GlobalOpts, Workspace};

#[derive(Args)]
pub struct LoginArgs {
    /// Email to attribute entries to
    pub email: String,
}

pub fn login(args: &LoginArgs, global: &GlobalOpts) -> Result<()> {
    let email = args.email.trim();
    if email.is_empty() {
        anyhow::bail!("Email must not be empty");
    }
    let ws = Workspace::open(global)?;
    save_identity(ws.store.as_ref(), &Identity::new(email)).context("Failed to save identity")?;
    println!("Signed in as {email}");
    Ok(())
}

pub fn logout(global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    clear_identity(ws.store.as_ref()).context("Failed to clear identity")?;
    println!("Signed out");
    Ok(())
}

pub fn whoami(global: &GlobalOpts, format: OutputFormat) -> Result<()> {
    let ws = Workspace::open(global)?;
    let identity = load_identity(ws.store.as_ref()).context("Failed to read identity")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&identity)?),
        OutputFormat::Text => match identity {
            Some(id) => println!(
                "{} (since {})",
                id.email,
                id.time.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
            ),
            None => println!("{GUEST}"),
        },
    }
    Ok(())
}
