//! SecretDrop command-line interface.

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use secretdrop_core::Config;

/// SecretDrop - share secrets behind a password, once
#[derive(Parser)]
#[command(name = "secretdrop")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file
    #[arg(short, long, env = "SECRETDROP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Generate a new system key
    Keygen,

    /// Configuration management
    Config(commands::config::ConfigArgs),

    /// Dual-encrypt a secret under a password and the system key
    Seal(commands::seal::SealArgs),

    /// Decrypt an envelope produced by `seal`
    Open(commands::seal::OpenArgs),

    /// Exercise the create/retrieve/exhaust cycle against an in-memory store
    Selftest,

    /// Show version information
    Version,
}

/// Run the CLI with the given arguments.
pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    match cli.command {
        Commands::Keygen => commands::keygen::run(),
        Commands::Config(args) => commands::config::run(args, cli.config.as_deref(), config),
        Commands::Seal(args) => commands::seal::seal(args, &config),
        Commands::Open(args) => commands::seal::open(args, &config),
        Commands::Selftest => commands::selftest::run(&config).await,
        Commands::Version => {
            println!("secretdrop {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
