use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod output;
mod workspace;

#[derive(Parser)]
#[command(
    name = "aether",
    version,
    about = "Local multi-agent assistant with an audit log and cost ledger"
)]
struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: output::OutputFormat,

    #[command(flatten)]
    global: workspace::GlobalOpts,

    #[command(subcommand)]
    command: commands::Commands,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let global = &cli.global;
    match &cli.command {
        commands::Commands::Ask(args) => commands::ask::run(args, global, cli.format),
        commands::Commands::Log(args) => commands::log::run(args, global, cli.format),
        commands::Commands::Cost(args) => commands::cost::run(args, global, cli.format),
        commands::Commands::Clear(args) => commands::clear::run(args, global),
        commands::Commands::Stats => commands::stats::run(global, cli.format),
        commands::Commands::Record(args) => commands::record::run(args, global, cli.format),
        commands::Commands::Login(args) => commands::identity::login(args, global),
        commands::Commands::Logout => commands::identity::logout(global),
        commands::Commands::Whoami => commands::identity::whoami(global, cli.format),
    }
}
