//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Liftlog - schema migrations for the workout store
#[derive(Parser, Debug)]
#[command(name = "liftlog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override the store path (":memory:" for a throwaway store)
    #[arg(short, long, global = true, env = "LIFTLOG_DATABASE")]
    pub database: Option<String>,

    /// Override the migrations directory
    #[arg(short, long, global = true)]
    pub migrations_dir: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply pending migrations and repair recognised legacy ones
    Migrate(MigrateArgs),

    /// Compare migration files against the ledger without writing
    Status(StatusArgs),

    /// Show what the ledger has recorded
    Ledger(LedgerArgs),
}

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: StatusOutput,

    /// Exit non-zero when a migrate run would fail on drift or orphaned rows
    #[arg(long)]
    pub check: bool,
}

/// Arguments for the ledger command
#[derive(Args, Debug)]
pub struct LedgerArgs {
    /// Show a single ledger row
    #[arg(long)]
    pub id: Option<String>,

    /// Print the recorded down script(s)
    #[arg(long)]
    pub show_down: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: StatusOutput,
}

/// Output format for commands that report a single result
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable log lines
    Text,
    /// JSON output
    Json,
}

/// Output format for commands that list rows
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutput {
    /// Table format
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
