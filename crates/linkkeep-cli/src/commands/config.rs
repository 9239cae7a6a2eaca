//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use linkkeep_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "max_backups": config.max_backups,
                    "log_file": config.log_file,
                    "links_path": config.links_path(),
                    "backup_dir": config.backup_dir(),
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:    {}", config.data_dir.display());
            println!(
                "  max_backups: {}",
                match config.max_backups {
                    0 => "unlimited".to_string(),
                    n => n.to_string(),
                }
            );
            println!(
                "  log_file:    {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Link file:   {}", config.links_path().display());
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(key: &str, value: &str, config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "max_backups" => {
            config.max_backups = value
                .trim()
                .parse()
                .context("Invalid value for max_backups. Use a whole number (0 keeps all).")?;
        }
        "log_file" => {
            config.log_file = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.into())
            };
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, max_backups, log_file",
                key
            );
        }
    }

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}
