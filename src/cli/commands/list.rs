//! Implementation of the `quotakeeper list` command.

use anyhow::Result;
use clap::Args;

use super::RecordOutput;
use crate::cli::display::{list_table, render_list};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::Engine;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only quotas with an unresolved increase request
    #[arg(long)]
    pub pending: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct ListOutput {
    pub records: Vec<RecordOutput>,
    pub total: usize,
}

impl CommandOutput for ListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["identity", "value", "pending request", "updated"]);
        for record in &self.records {
            table.add_row(vec![
                record.identity.clone(),
                record.value_text(),
                record.pending_summary().unwrap_or_else(|| "-".to_string()),
                record.updated_at.format("%Y-%m-%d %H:%M").to_string(),
            ]);
        }
        render_list("managed quota", table, self.total)
    }
}

pub async fn execute(args: ListArgs, config: &Config, json_mode: bool) -> Result<()> {
    let engine = Engine::connect(config).await?;
    let records: Vec<RecordOutput> = engine
        .controller()
        .list()
        .await?
        .iter()
        .filter(|record| !args.pending || record.pending.is_some())
        .map(RecordOutput::from)
        .collect();

    output(
        &ListOutput {
            total: records.len(),
            records,
        },
        json_mode,
    );
    Ok(())
}
