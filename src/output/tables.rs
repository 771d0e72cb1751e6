use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::cluster::types::ResourceGroup;
use crate::error::ErrorClass;

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

pub fn group_cell(group: ResourceGroup) -> Cell {
    match group {
        ResourceGroup::Core => Cell::new("core"),
        ResourceGroup::Origin => Cell::new("origin").fg(TableColor::Magenta),
    }
}

/// Creation status: created, failed, or not attempted (dry runs and cancelled runs).
pub fn status_cell(created: bool, failed: bool) -> Cell {
    if created {
        Cell::new("created").fg(TableColor::Green)
    } else if failed {
        Cell::new("failed").fg(TableColor::Red)
    } else {
        Cell::new("pending").fg(TableColor::DarkGrey)
    }
}

pub fn error_class_cell(class: ErrorClass) -> Cell {
    match class {
        ErrorClass::Configuration => Cell::new("configuration").fg(TableColor::Yellow),
        ErrorClass::Transport => Cell::new("transport").fg(TableColor::Red),
        ErrorClass::Mapping => Cell::new("mapping").fg(TableColor::Magenta),
        ErrorClass::Cancelled => Cell::new("cancelled").fg(TableColor::DarkGrey),
    }
}
