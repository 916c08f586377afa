use brain_service::app::{handle_fatal_error, init_logging, run, AppConfig};
use brain_service::config::{load_config, ServiceConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// Aggregation service joining the task and group directories
#[derive(Parser)]
#[command(name = "brain-service", version)]
#[command(about = "Statistics and group assignment for the task UI", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API (default command)
    Serve {
        /// Path to a TOML configuration file
        #[arg(short = 'c', long, env = "BRAIN_CONFIG")]
        config: Option<PathBuf>,

        /// Port to listen on, overriding configuration and PORT
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the effective configuration as TOML
    Config {
        /// Path to a TOML configuration file
        #[arg(short = 'c', long, env = "BRAIN_CONFIG")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&AppConfig::new(cli.verbose));

    let result = match cli.command {
        Some(Commands::Serve { config, port }) => serve(config, port).await,
        Some(Commands::Config { config }) => print_config(config).await,
        None => serve(None, None).await,
    };

    if let Err(e) = result {
        handle_fatal_error(e, cli.verbose);
    }
}

async fn serve(path: Option<PathBuf>, port: Option<u16>) -> anyhow::Result<()> {
    let mut config = load_config(path.as_deref()).await?;
    if let Some(port) = port {
        debug!("Port {} given on the command line", port);
        config.port = port;
    }
    run(config).await
}

async fn print_config(path: Option<PathBuf>) -> anyhow::Result<()> {
    let config: ServiceConfig = load_config(path.as_deref()).await?;
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
