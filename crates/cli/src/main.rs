//! Campanion CLI: the main entry point.
//!
//! Commands:
//! - `onboard`: Write a default config file
//! - `chat`: Interactive chat or single-message mode
//! - `route`: Show how a query would be routed
//! - `serve`: Start the HTTP gateway
//! - `doctor`: Check config, provider and vector store

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "campanion",
    about = "Campanion — your campus companion chatbot",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.campanion/config.toml
    #[arg(short, long, global = true, env = "CAMPANION_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Onboard,

    /// Chat about courses, interviews, culture and social life
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Print answers at once instead of word by word
        #[arg(long)]
        no_stream: bool,
    },

    /// Show extracted course codes, scores and chosen collections for a query
    Route {
        /// The query to route
        query: String,

        /// Print the routing decision as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Diagnose configuration and connectivity
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Onboard => commands::onboard::run(config_path).await?,
        Commands::Chat { message, no_stream } => {
            commands::chat::run(config_path, message, no_stream).await?
        }
        Commands::Route { query, json } => commands::route::run(config_path, &query, json).await?,
        Commands::Serve { port } => commands::serve::run(config_path, port).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
    }

    Ok(())
}
