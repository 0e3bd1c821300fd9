mod app;
mod check_cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use watchdog_config::DEFAULT_CONFIG_FILE;

#[derive(Parser)]
#[command(name = "watchdog")]
#[command(about = "Watches account balances and stale pull requests, alerts through Apprise")]
#[command(version)]
struct Cli {
    /// Path to the YAML config file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log alerts instead of sending them
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the monitor until interrupted (default)
    Run,
    /// Validate the config and print its redacted, resolved form
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => app::run(&cli.config, cli.dry_run).await,
        Commands::Check => {
            if !check_cmd::run(&cli.config).await? {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
