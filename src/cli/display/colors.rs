//! Status color mapping for CLI output.
//!
//! `console` disables styling when stdout is not a terminal or `NO_COLOR` is set.

use console::{style, StyledObject};

use crate::domain::models::RequestStatus;

/// Color for an increase-request status.
pub fn colorize_status(status: RequestStatus) -> StyledObject<&'static str> {
    let text = status.as_str();
    match status {
        RequestStatus::Approved => style(text).green().bold(),
        RequestStatus::Pending => style(text).blue(),
        RequestStatus::CaseOpened => style(text).yellow(),
        RequestStatus::Denied | RequestStatus::NotApproved => style(text).red().bold(),
        RequestStatus::CaseClosed => style(text).dim(),
    }
}

/// Color for a per-resource reconciliation outcome.
pub fn colorize_outcome(outcome: &str) -> StyledObject<&str> {
    match outcome {
        "converged" | "unchanged" | "increased" => style(outcome).green(),
        "pending" => style(outcome).yellow(),
        "failed" => style(outcome).red().bold(),
        _ => style(outcome),
    }
}
