//! Report rendering: JSON for archiving, boxed text for the terminal.

pub mod json;
pub mod terminal;

pub use json::{summary_to_json_pretty, to_json, to_json_pretty};
pub use terminal::{format_round, format_summary};
