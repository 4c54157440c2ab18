pub mod ask;
pub mod clear;
pub mod cost;
pub mod identity;
pub mod log;
pub mod record;
pub mod stats;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Send a prompt to the agents (and the inference server, if configured)
    Ask(ask::AskArgs),
    /// List audit log entries (most recent first)
    Log(log::LogArgs),
    /// Show or reset the cumulative cost ledger
    Cost(cost::CostArgs),
    /// Delete every audit log entry
    Clear(clear::ClearArgs),
    /// Show aggregate statistics over the audit log
    Stats,
    /// Append an entry produced by another tool to the audit log
    Record(record::RecordArgs),
    /// Sign in; later entries are attributed to this email
    Login(identity::LoginArgs),
    /// Sign out
    Logout,
    /// Show the signed-in identity
    Whoami,
}
