//! Table builder wrapper around comfy-table for consistent list display.

use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};
use console::style;

/// Create a borderless list table with the given headers.
pub fn list_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h.to_uppercase()).set_alignment(CellAlignment::Left)),
        );
    table
}

/// Render the table with a count header.
pub fn render_list(entity_name: &str, table: Table, total: usize) -> String {
    if total == 0 {
        return format!("No {entity_name}s found.");
    }
    let noun = if total == 1 {
        entity_name.to_string()
    } else {
        format!("{entity_name}s")
    };
    format!("{} {}:\n{}", style(total).bold(), noun, table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list() {
        let table = list_table(&["identity"]);
        assert_eq!(render_list("quota", table, 0), "No quotas found.");
    }

    #[test]
    fn test_rows_rendered() {
        let mut table = list_table(&["identity", "value"]);
        table.add_row(vec!["vpc/L-F678F1CE", "75"]);
        let rendered = render_list("quota", table, 1);
        assert!(rendered.contains("vpc/L-F678F1CE"));
        assert!(rendered.contains("IDENTITY"));
    }
}
