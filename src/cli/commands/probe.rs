//! Implementation of the `quotakeeper probe` command.

use anyhow::Result;
use clap::Args;

use crate::cli::display::{list_table, render_list};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, ServiceDescriptor};
use crate::infrastructure::Engine;

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Also list every service that exposes quotas
    #[arg(long)]
    pub services: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct ProbeOutput {
    pub available: bool,
    pub region: String,
    pub service_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<ServiceDescriptor>,
}

impl CommandOutput for ProbeOutput {
    fn to_human(&self) -> String {
        let mut text = format!(
            "Quota service available in {} ({} services).",
            self.region, self.service_count
        );
        if !self.services.is_empty() {
            let mut table = list_table(&["service code", "name"]);
            for service in &self.services {
                table.add_row(vec![service.service_code.as_str(), service.service_name.as_str()]);
            }
            text.push('\n');
            text.push_str(&render_list("service", table, self.services.len()));
        }
        text
    }
}

pub async fn execute(args: ProbeArgs, config: &Config, json_mode: bool) -> Result<()> {
    let engine = Engine::connect(config).await?;
    let services = engine.probe().check().await?;

    output(
        &ProbeOutput {
            available: true,
            region: config.client.region.clone(),
            service_count: services.len(),
            services: if args.services { services } else { Vec::new() },
        },
        json_mode,
    );
    Ok(())
}
