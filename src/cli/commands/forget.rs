//! Implementation of the `quotakeeper forget` command.

use anyhow::Result;
use clap::Args;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, QuotaIdentity};
use crate::infrastructure::Engine;

#[derive(Args, Debug)]
pub struct ForgetArgs {
    /// Quota token, `<service_code>/<quota_code>`
    pub token: String,
}

#[derive(Debug, serde::Serialize)]
pub struct ForgetOutput {
    pub identity: String,
    pub removed: bool,
}

impl CommandOutput for ForgetOutput {
    fn to_human(&self) -> String {
        if self.removed {
            format!("No longer managing {}. The remote quota is unchanged.", self.identity)
        } else {
            format!("{} was not managed.", self.identity)
        }
    }
}

pub async fn execute(args: ForgetArgs, config: &Config, json_mode: bool) -> Result<()> {
    let identity = QuotaIdentity::decode(&args.token)?;
    let engine = Engine::connect(config).await?;
    let removed = engine.controller().delete(&identity).await?;

    output(
        &ForgetOutput {
            identity: identity.encode(),
            removed,
        },
        json_mode,
    );
    Ok(())
}
