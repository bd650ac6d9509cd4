//! # Portfolio CLI (`portfolio`)
//!
//! Initializes and seeds the database, prints the aggregated profile, and
//! starts the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! portfolio --config ./config/portfolio.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `portfolio init` | Create the SQLite database and schema |
//! | `portfolio seed [--file seed.toml]` | Replace all data with the sample or a seed file |
//! | `portfolio profile` | Print the aggregated profile document |
//! | `portfolio serve` | Start the HTTP server |

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use portfolio_api::{config, migrate, profile, seed, server};

/// Portfolio CLI: a personal portfolio served as a JSON API.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file.
#[derive(Parser)]
#[command(
    name = "portfolio",
    about = "Portfolio API: profile, skills, links, projects and work history over HTTP",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/portfolio.toml")]
    config: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all six tables. Running it
    /// multiple times is safe.
    Init,

    /// Replace all data with a seed dataset.
    ///
    /// Without `--file`, loads the built-in sample portfolio.
    Seed {
        /// TOML seed file (profile, skills, links, projects, work_experience).
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Print the aggregated profile document as JSON.
    Profile,

    /// Start the HTTP server.
    ///
    /// Binds to `[server].bind`. Requires an admin password in `[auth]` or
    /// `PORTFOLIO_ADMIN_PASSWORD`.
    Serve,
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Seed { file } => {
            seed::run_seed(&cfg, file.as_deref()).await?;
        }
        Commands::Profile => {
            profile::run_profile(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
