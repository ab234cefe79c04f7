mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{ApplyArgs, DiffArgs, RollbackArgs};
use output::OutputFormat;

/// reposync - Reconcile repository configuration with a remote
#[derive(Parser)]
#[command(name = "reposync")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose (debug) logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Log filter, e.g. `info` or `reposync_lib=debug` (overrides RUST_LOG)
  #[arg(long, global = true)]
  log_level: Option<String>,

  /// Output format
  #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
  format: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Show what would change between two states
  Diff {
    #[command(flatten)]
    args: DiffArgs,

    /// Write the diff document to this file
    #[arg(long)]
    output: Option<PathBuf>,
  },

  /// Apply the difference between two states to the remote
  Apply(ApplyArgs),

  /// Execute a rollback plan written by `apply`
  Rollback(RollbackArgs),
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  // Initialize logging
  let filter = match (&cli.log_level, cli.verbose) {
    (Some(level), _) => EnvFilter::new(level),
    (None, true) => EnvFilter::new("debug"),
    (None, false) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Diff { args, output } => cmd::cmd_diff(&args, output, cli.format),
    Commands::Apply(args) => cmd::cmd_apply(&args, cli.format),
    Commands::Rollback(args) => cmd::cmd_rollback(&args, cli.format),
  }
}
