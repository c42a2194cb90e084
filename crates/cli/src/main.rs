//! KubeClaw CLI: the main entry point.
//!
//! Commands:
//! - `chat`: Interactive session, or one question with `-m`
//! - `serve`: Start the HTTP query server
//! - `tools`: List the tool catalog
//! - `config`: Print the effective configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "kubeclaw",
    about = "KubeClaw — ask questions about your cluster in plain language",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the cluster assistant
    Chat {
        /// Ask a single question instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Include every reasoning round in the output
        #[arg(long)]
        show_reasoning: bool,
    },

    /// Start the HTTP query server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List the available tools
    Tools,

    /// Print the effective configuration (API keys masked)
    Config {
        /// Print the config file path instead
        #[arg(long)]
        path: bool,

        /// Print the built-in defaults instead
        #[arg(long, conflicts_with = "path")]
        defaults: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Chat {
            message,
            show_reasoning,
        } => commands::chat::run(message, show_reasoning).await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Tools => commands::tools::run().await?,
        Commands::Config { path, defaults } => commands::config_cmd::run(path, defaults).await?,
    }

    Ok(())
}
