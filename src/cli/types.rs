//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::{
    apply::ApplyArgs, forget::ForgetArgs, import::ImportArgs, init::InitArgs, list::ListArgs,
    probe::ProbeArgs, show::ShowArgs,
};

#[derive(Parser, Debug)]
#[command(name = "quotakeeper")]
#[command(about = "Declarative service quota reconciliation", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .quotakeeper/config.yaml and local.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize configuration and the record database
    Init(InitArgs),

    /// Converge the quotas declared in a manifest
    Apply(ApplyArgs),

    /// Start managing an existing quota by its service/quota token
    Import(ImportArgs),

    /// Refresh and show a managed quota
    Show(ShowArgs),

    /// List managed quotas
    List(ListArgs),

    /// Stop managing a quota (the remote quota is left as is)
    Forget(ForgetArgs),

    /// Check that the quota service is usable from this account and region
    Probe(ProbeArgs),
}
