//! Implementation of the `quotakeeper import` command.

use anyhow::Result;
use clap::Args;

use super::RecordOutput;
use crate::cli::output::{output, CommandOutput};
use crate::domain::errors::DomainError;
use crate::domain::models::Config;
use crate::infrastructure::Engine;

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Quota token, `<service_code>/<quota_code>`
    pub token: String,
}

#[derive(Debug, serde::Serialize)]
pub struct ImportOutput {
    pub record: RecordOutput,
}

impl CommandOutput for ImportOutput {
    fn to_human(&self) -> String {
        format!(
            "Imported {} with value {}.",
            self.record.identity,
            self.record.value_text()
        )
    }
}

pub async fn execute(args: ImportArgs, config: &Config, json_mode: bool) -> Result<()> {
    let engine = Engine::connect(config).await?;
    let record = engine
        .controller()
        .import(&args.token)
        .await?
        .ok_or_else(|| DomainError::NotFound(args.token.clone()))?;

    output(
        &ImportOutput {
            record: RecordOutput::from(&record),
        },
        json_mode,
    );
    Ok(())
}
