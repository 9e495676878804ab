mod cli;
mod config;
mod extract;
mod graph;
mod hub;
mod ingest;
mod layout;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "memopolis",
    version,
    about = "Knowledge-graph city over Markdown memory files"
)]
struct Cli {
    /// Config file path (default: ~/.memopolis/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Watch the workspace and stream snapshot frames to stdout
    Serve {
        /// Also emit a layout frame every N snapshots
        #[arg(long)]
        layout_every: Option<u64>,
    },
    /// Build the graph once and print a snapshot frame
    Build,
    /// Project a snapshot frame (file or stdin) into a layout frame
    Layout {
        /// Snapshot JSON file; stdin when omitted
        #[arg(long)]
        input: Option<PathBuf>,
        /// Override the simulation iteration count
        #[arg(long)]
        iterations: Option<usize>,
        /// Override the bounding square half-width
        #[arg(long)]
        bounds: Option<f64>,
    },
    /// Print graph statistics and the key-node ranking
    Stats {
        /// How many key nodes to include
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::MemopolisConfig::load_from(path)?,
        None => config::MemopolisConfig::load()?,
    };

    // Initialize tracing with the configured log level.
    // Log to stderr so stdout stays clean for JSON frames.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { layout_every } => {
            cli::serve(config, layout_every).await?;
        }
        Command::Build => {
            cli::build(&config).await?;
        }
        Command::Layout {
            input,
            iterations,
            bounds,
        } => {
            if let Some(iterations) = iterations {
                config.layout.iterations = iterations;
            }
            if let Some(bounds) = bounds {
                config.layout.bounds = bounds;
            }
            cli::project_layout(&config, input.as_deref()).await?;
        }
        Command::Stats { top } => {
            cli::stats(&config, top).await?;
        }
    }

    Ok(())
}
