//! Command-line interface.

pub mod commands;
pub mod display;
pub mod output;
pub mod types;

pub use types::{Cli, Commands};

use anyhow::Result;
use std::path::Path;

use crate::domain::errors::DomainError;
use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;

/// Load the configuration, from `path` when given.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Run the parsed command.
pub async fn run(cli: Cli, config: &Config) -> Result<()> {
    match cli.command {
        Commands::Init(args) => commands::init::execute(args, cli.json).await,
        Commands::Apply(args) => commands::apply::execute(args, config, cli.json).await,
        Commands::Import(args) => commands::import::execute(args, config, cli.json).await,
        Commands::Show(args) => commands::show::execute(args, config, cli.json).await,
        Commands::List(args) => commands::list::execute(args, config, cli.json).await,
        Commands::Forget(args) => commands::forget::execute(args, config, cli.json).await,
        Commands::Probe(args) => commands::probe::execute(args, config, cli.json).await,
    }
}

/// Print an error and exit with a non-zero status.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    let kind = err
        .downcast_ref::<DomainError>()
        .map(|e| e.kind().as_str());

    if json_mode {
        let body = serde_json::json!({
            "success": false,
            "error": format!("{err:#}"),
            "kind": kind,
        });
        eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("{} {err:#}", console::style("Error:").red().bold());
    }
    std::process::exit(1);
}
