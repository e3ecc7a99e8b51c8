//! Permatrix CLI: inspect and resolve role permission matrices.
//!
//! ```bash
//! permatrix tree --catalog catalog.json
//! permatrix resolve --catalog catalog.json --template manager.json --role manager
//! permatrix fetch --config permatrix.toml --role cashier
//! ```
//!
//! See `permatrix --help` for all available commands and options.

mod commands;

use clap::{Parser, Subcommand};
use commands::OfflineArgs;
use permatrix_core::logging::{init_logging, LogLevel, LoggingConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "permatrix", about = "Role permission matrix tool", version)]
struct Cli {
    /// Log level for diagnostics on stderr (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the flattened menu tree
    Tree {
        /// Catalog file (.json or .toml)
        #[arg(long)]
        catalog: PathBuf,
    },
    /// Merge template and override files for one role and print the matrix
    Resolve {
        #[command(flatten)]
        input: OfflineArgs,
    },
    /// Print the bulk save payload for one role as JSON
    Export {
        #[command(flatten)]
        input: OfflineArgs,
    },
    /// Load permissions from the permission API and print the matrix
    Fetch {
        /// Configuration file
        #[arg(long, default_value = "permatrix.toml")]
        config: PathBuf,

        /// Only this role (defaults to the configured roles)
        #[arg(long)]
        role: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Tree { catalog } => {
            init_cli_logging(&cli.log_level)?;
            commands::tree::run(&catalog)
        }
        Commands::Resolve { input } => {
            init_cli_logging(&cli.log_level)?;
            commands::resolve::run(&input).await
        }
        Commands::Export { input } => {
            init_cli_logging(&cli.log_level)?;
            commands::resolve::export(&input).await
        }
        // Logging follows the config file here
        Commands::Fetch { config, role } => commands::fetch::run(&config, role.as_deref()).await,
    }
}

fn init_cli_logging(level: &str) -> anyhow::Result<()> {
    let level: LogLevel = level.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    init_logging(&LoggingConfig::default().with_level(level))
}
