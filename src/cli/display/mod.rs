//! Styled tables and status colors for human-readable output.

pub mod colors;
pub mod table;

pub use colors::{colorize_outcome, colorize_status};
pub use table::{list_table, render_list};
