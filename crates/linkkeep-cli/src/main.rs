//! linkkeep CLI
//!
//! Command-line interface for linkkeep - a personal bookmark organizer.
//! With no flags it starts the interactive menu.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use linkkeep_core::{Config, JsonPersistence, SearchMode, SearchQuery, Store};

mod bookmarks;
mod commands;
mod csv_io;
mod menu;
mod output;
mod prompt;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "linkkeep")]
#[command(about = "linkkeep - Organize links with descriptions, categories and tags")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Config file to use instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(flatten)]
    action: Action,

    #[command(flatten)]
    details: LinkDetails,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// One-shot operations; without any of these the menu starts
#[derive(Args, Debug, Default)]
#[group(multiple = false)]
struct Action {
    /// Add a link with the given URL
    #[arg(long, value_name = "URL")]
    add: Option<String>,

    /// Search url, description, categories and tags for TEXT (any may match)
    #[arg(long, value_name = "TEXT")]
    query: Option<String>,

    /// Export links to a CSV file
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Import links from a CSV file
    #[arg(long = "import", value_name = "FILE")]
    import_file: Option<PathBuf>,

    /// Import links from a browser bookmark HTML export
    #[arg(long, value_name = "FILE")]
    import_html: Option<PathBuf>,

    /// Create a backup of the link file
    #[arg(long)]
    backup: bool,

    /// List available backups
    #[arg(long)]
    list_backups: bool,

    /// Restore a backup (the most recent if NAME is omitted)
    #[arg(long, value_name = "NAME", num_args = 0..=1)]
    restore: Option<Option<String>>,
}

/// Extra fields for --add
#[derive(Args, Debug, Default)]
struct LinkDetails {
    /// Description for the added link
    #[arg(long, requires = "add")]
    description: Option<String>,

    /// Category for the added link (repeatable)
    #[arg(long = "category", requires = "add")]
    categories: Vec<String>,

    /// Tag for the added link (repeatable)
    #[arg(long = "tag", requires = "add")]
    tags: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, max_backups, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

impl Action {
    fn is_empty(&self) -> bool {
        self.add.is_none()
            && self.query.is_none()
            && self.export.is_none()
            && self.import_file.is_none()
            && self.import_html.is_none()
            && !self.backup
            && !self.list_backups
            && self.restore.is_none()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Commands that don't need the link file
    if let Some(Commands::Config { command }) = &cli.command {
        return handle_config_command(command.clone(), cli.config.as_ref(), &output);
    }

    let config =
        Config::load_with_cli_override(cli.config.as_ref()).context("Failed to load configuration")?;
    init_logging(&config);

    let persistence = JsonPersistence::from_config(&config);
    let loaded = persistence
        .load()
        .with_context(|| format!("Failed to open link file {:?}", persistence.path()))?;
    if let Some(recovered) = &loaded.recovered {
        output.warning(&recovered.to_string());
        if let Some(suggestion) = recovered.recovery_suggestion() {
            output.warning(suggestion);
        }
    }
    let mut store = loaded.store;

    if cli.action.is_empty() {
        let session = menu::Session::new(
            store,
            persistence,
            config,
            output,
            prompt::Prompter::stdin(),
        );
        session.run().await;
        return Ok(());
    }

    let mutated = run_action(cli.action, cli.details, &mut store, &persistence, &output)?;
    if mutated {
        persistence
            .save(&store)
            .with_context(|| format!("Failed to save links to {:?}", persistence.path()))?;
    }
    Ok(())
}

/// Run a one-shot flag operation
///
/// Returns whether the store changed and needs saving.
fn run_action(
    action: Action,
    details: LinkDetails,
    store: &mut Store,
    persistence: &JsonPersistence,
    output: &Output,
) -> Result<bool> {
    if let Some(url) = action.add {
        commands::link::add(
            store,
            &url,
            details.description.as_deref().unwrap_or(""),
            &details.categories,
            &details.tags,
            output,
        )?;
        return Ok(true);
    }

    if let Some(text) = action.query {
        commands::search::query(store, &SearchQuery::everywhere(&text), SearchMode::Or, output)?;
        return Ok(false);
    }

    if let Some(path) = action.export {
        commands::transfer::export_csv(store, &path, output)?;
        return Ok(false);
    }

    if let Some(path) = action.import_file {
        let summary = commands::transfer::import_csv(store, &path, output)?;
        return Ok(summary.added > 0);
    }

    if let Some(path) = action.import_html {
        let summary = commands::transfer::import_html(store, &path, output)?;
        return Ok(summary.added > 0);
    }

    if action.backup {
        commands::backup::create(persistence, output)?;
        return Ok(false);
    }

    if action.list_backups {
        commands::backup::list(persistence, output)?;
        return Ok(false);
    }

    if let Some(name) = action.restore {
        // Restoring writes the link file itself
        *store = commands::backup::restore(persistence, name.as_deref(), output)?;
        return Ok(false);
    }

    Ok(false)
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(&key, &value, config_path, output)
        }
    }
}

/// Initialize logging
///
/// With LINKKEEP_LOG set, logs at that level go to a file
/// (config.log_file or {data_dir}/debug.log). Otherwise warnings go to stderr.
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("LINKKEEP_LOG") else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("linkkeep_core=warn,linkkeep_cli=warn"))
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
        return;
    };

    let log_path = config.log_path();
    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!(
        "linkkeep_core={},linkkeep_cli={}",
        log_level, log_level
    ));

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("Logging initialized to {:?}", log_path);
}
