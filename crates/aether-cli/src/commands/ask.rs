use std::sync::Arc;

use aether_dispatch::{Dispatcher, EngineHandle};
use aether_engine::{EngineConfig, EngineState, OllamaEngine};
use anyhow::{Context, Result};
use clap::Args;

use crate::output::format::{format_cost, format_messages};
use crate::output::OutputFormat;
use crate::workspace::{GlobalOpts, Workspace};

#[derive(Args)]
pub struct AskArgs {
    /// The prompt; multiple words are joined with spaces
    #[arg(required = true, num_args = 1..)]
    pub prompt: Vec<String>,

    /// Attribute the log entry to this user instead of the signed-in one
    #[arg(long)]
    pub user: Option<String>,

    /// Skip the inference server even if one is configured
    #[arg(long)]
    pub offline: bool,
}

pub fn run(args: &AskArgs, global: &GlobalOpts, format: OutputFormat) -> Result<()> {
    let ws = Workspace::open(global)?;
    let prompt = args.prompt.join(" ");
    let user = ws.resolve_user(args.user.as_deref())?;

    let engine_url = if args.offline {
        None
    } else {
        ws.config.engine_url.clone()
    };

    let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
    let turn = rt.block_on(async {
        let mut dispatcher = Dispatcher::from_config(ws.audit.clone(), &ws.config);
        if let Some(url) = engine_url.as_deref() {
            let handle = EngineHandle::new(OllamaEngine::new(url));
            let config = EngineConfig {
                cache_enabled: ws.config.cache_enabled,
            };
            if let EngineState::Failed(reason) = handle.initialize(&ws.config.model, &config).await {
                eprintln!("Inference server unavailable, using local agents only: {reason}");
            }
            dispatcher = dispatcher.with_engine(Arc::new(handle));
        }
        dispatcher.dispatch_turn(&prompt, user.as_deref()).await
    })?;

    let total = match turn.ledger_total {
        Some(total) => total,
        None => ws.audit.ledger_total().context("Failed to read cost ledger")?,
    };

    match format {
        OutputFormat::Json => {
            let out = serde_json::json!({
                "messages": turn.messages,
                "cost": turn.cost,
                "total": total,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            print!("{}", format_messages(&turn.messages, format));
            println!();
            println!("Cost: {}  (total {})", format_cost(turn.cost), format_cost(total));
        }
    }
    Ok(())
}
