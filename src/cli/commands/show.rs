//! Implementation of the `quotakeeper show` command.

use anyhow::Result;
use clap::Args;

use super::RecordOutput;
use crate::cli::display::colorize_status;
use crate::cli::output::{format_value, output, CommandOutput};
use crate::domain::models::{Config, ObservedQuota, QuotaIdentity};
use crate::infrastructure::Engine;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Quota token, `<service_code>/<quota_code>`
    pub token: String,
}

#[derive(Debug, serde::Serialize)]
pub struct ShowOutput {
    pub identity: String,
    /// Record dropped because the quota no longer exists remotely
    pub removed: bool,
    pub record: Option<RecordOutput>,
    pub observed: Option<ObservedQuota>,
    pub drifted: bool,
}

impl CommandOutput for ShowOutput {
    fn to_human(&self) -> String {
        let (Some(record), Some(observed)) = (&self.record, &self.observed) else {
            return format!(
                "{} no longer exists remotely; its record was removed.",
                self.identity
            );
        };

        let mut lines = vec![format!("Quota: {}", record.identity)];
        if let Some(name) = &observed.quota_name {
            lines.push(format!("Name: {name}"));
        }
        if let Some(service) = &observed.service_name {
            lines.push(format!("Service: {service}"));
        }
        lines.push(format!(
            "Effective value: {}{}",
            format_value(observed.value),
            if observed.is_default { " (service default)" } else { "" }
        ));
        lines.push(format!("Last applied: {}", record.value_text()));
        if self.drifted {
            lines.push("Drift: remote value changed outside quotakeeper".to_string());
        }
        lines.push(format!("Adjustable: {}", observed.adjustable));
        if let (Some(id), Some(status)) = (&record.pending_request_id, record.pending_status) {
            lines.push(format!("Pending request: {id} {}", colorize_status(status)));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: ShowArgs, config: &Config, json_mode: bool) -> Result<()> {
    let identity = QuotaIdentity::decode(&args.token)?;
    let engine = Engine::connect(config).await?;

    let result = match engine.controller().refresh(&identity).await? {
        Some(refreshed) => ShowOutput {
            identity: identity.encode(),
            removed: false,
            drifted: refreshed.has_drifted(),
            record: Some(RecordOutput::from(&refreshed.record)),
            observed: Some(refreshed.observed),
        },
        None => ShowOutput {
            identity: identity.encode(),
            removed: true,
            record: None,
            observed: None,
            drifted: false,
        },
    };

    output(&result, json_mode);
    Ok(())
}
