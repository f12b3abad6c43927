use agentloom_core::{default_config_file, AgentloomConfig};
use anyhow::Context;
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use crate::context::GlobalOptions;
use crate::output::{print_json, print_success, OutputFormat};

#[derive(Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Write a configuration file with the default settings")]
    Init {
        #[arg(short, long, help = "Overwrite an existing file")]
        force: bool,

        #[arg(short, long, help = "Target file (defaults to the user config directory)")]
        path: Option<PathBuf>,
    },

    #[command(about = "Print the effective configuration")]
    Show {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    #[command(about = "Print where configuration and tokens are read from")]
    Path,
}

pub fn handle_config_command(opts: &GlobalOptions, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Init { force, path } => {
            let path = match path.or_else(default_config_file) {
                Some(p) => p,
                None => anyhow::bail!("Could not determine a config directory; pass --path"),
            };
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            AgentloomConfig::default()
                .write_to(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            print_success(&format!("Wrote {}", path.display()));
            Ok(())
        }
        ConfigCommand::Show { format } => {
            let mut config = AgentloomConfig::load().context("Failed to load configuration")?;
            if let Some(url) = &opts.api_url {
                config.api.base_url = url.clone();
            }
            if format.is_json() {
                return print_json(&config);
            }
            print!("{}", config.to_toml()?);
            Ok(())
        }
        ConfigCommand::Path => {
            let config_file = default_config_file()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string());
            let token_file = AgentloomConfig::load()
                .ok()
                .and_then(|c| c.token_path())
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("  {:<14} {}", "Config file:".bold(), config_file);
            println!("  {:<14} {}", "Token file:".bold(), token_file);
            Ok(())
        }
    }
}
