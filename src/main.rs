use anyhow::Result;
use clap::{Parser, Subcommand};
use nerkh::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for nerkh::AppCommand {
    fn from(cmd: Commands) -> nerkh::AppCommand {
        match cmd {
            Commands::Serve => nerkh::AppCommand::Serve,
            Commands::Report => nerkh::AppCommand::Report,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Publish reports on a schedule and answer bot commands (default)
    Serve,
    /// Fetch prices once and print the report
    Report,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing .env file is fine; the environment may already be set.
    let _ = dotenvy::dotenv();
    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => nerkh::setup::setup(),
        Some(cmd) => nerkh::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => nerkh::run_command(nerkh::AppCommand::Serve, cli.config_path.as_deref()).await,
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
