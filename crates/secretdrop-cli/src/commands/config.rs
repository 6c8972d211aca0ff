//! Configuration management commands.

use std::path::{Path, PathBuf};

use clap::Args;
use secretdrop_core::config::Config;
use secretdrop_core::{paths, SecretString};
use secretdrop_secrets::resolve_system_key;

/// Config command arguments.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(clap::Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration (system key redacted)
    Show,

    /// Initialize a configuration file with defaults
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration file path
    Path,

    /// Validate configuration and the system key
    Validate,
}

/// Run the config command.
pub fn run(args: ConfigArgs, path: Option<&Path>, config: Config) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            println!("{}", serde_json::to_string_pretty(&redacted(config))?);
        }

        ConfigCommand::Init { force } => {
            let path = config_path(path)?;

            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists: {:?}. Use --force to overwrite.",
                    path
                );
            }

            // Defaults only; never persist a key that came from the environment.
            Config::default().save(&path)?;

            println!("Created config file: {:?}", path);
            println!("  Tip: run 'secretdrop keygen' and set SECRETDROP_SYSTEM_KEY.");
        }

        ConfigCommand::Path => {
            println!("{}", config_path(path)?.display());
        }

        ConfigCommand::Validate => {
            if let Err(e) = config.validate() {
                anyhow::bail!("Configuration error: {}", e);
            }
            resolve_system_key(&config).map_err(|e| anyhow::anyhow!("{}", e))?;
            println!("Configuration is valid");
        }
    }

    Ok(())
}

fn config_path(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(paths::config_file()?),
    }
}

fn redacted(mut config: Config) -> Config {
    if config.system_key.is_some() {
        config.system_key = Some(SecretString::new("[REDACTED]"));
    }
    config
}
