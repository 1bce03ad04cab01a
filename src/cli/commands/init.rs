//! Implementation of the `quotakeeper init` command.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::setup::{create_config_dir, create_config_file, run_migrations, SetupPaths};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration file
    #[arg(long, short)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub config_file: PathBuf,
    pub config_written: bool,
    pub database_file: PathBuf,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if self.config_written {
            lines.push(format!("  config:   {}", self.config_file.display()));
        }
        lines.push(format!("  database: {}", self.database_file.display()));
        lines.join("\n")
    }
}

pub async fn execute(args: InitArgs, json_mode: bool) -> Result<()> {
    let paths = SetupPaths::at(&args.path);
    let was_initialized = paths.is_initialized();

    create_config_dir(&paths)?;
    let config_written = create_config_file(&paths, args.force)?;
    run_migrations(&paths).await?;

    let message = if was_initialized && !config_written {
        "Project already initialized. Use --force to rewrite the configuration.".to_string()
    } else {
        "Initialized quotakeeper project.".to_string()
    };

    output(
        &InitOutput {
            success: true,
            message,
            config_file: paths.config_file,
            config_written,
            database_file: paths.database_file,
        },
        json_mode,
    );
    Ok(())
}
