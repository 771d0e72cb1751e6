use std::fmt::Write;

use crate::report::RunReport;

use super::styling::{bright, bright_green, bright_red, bright_yellow, cyan, dim};
use super::tables::{create_table, cyan_header, error_class_cell, group_cell, status_cell};

/// Prints a human-readable summary of a run to stderr.
///
/// Displays an overview, the mapped resources with their creation status,
/// and every accumulated error in the order it was recorded.
pub fn print_summary(report: &RunReport) {
    eprintln!("{}", render_summary(report));
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn render_summary(report: &RunReport) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "📊", "Overview");

    let outcome = match (report.succeeded, report.dry_run) {
        (true, true) => bright_green("ready to instantiate"),
        (true, false) => bright_green("instantiated"),
        (false, _) => bright_red("failed"),
    };

    let _ = writeln!(
        output,
        "  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n",
        dim("Template:"),
        cyan(&report.template),
        dim("Target namespace:"),
        cyan(&report.target_namespace),
        dim("Required service:"),
        cyan(&report.required_service),
        dim("Resources created:"),
        bright_yellow(format!(
            "{}/{}",
            report.created_resources, report.total_resources
        )),
        dim("Outcome:"),
        outcome,
        dim("Run date:"),
        dim(report.collected_at.format("%Y-%m-%d %H:%M UTC"))
    );

    if report.resources.is_empty() {
        let _ = writeln!(output, "{}\n", bright_yellow("No resources were mapped."));
    } else {
        add_section_header(&mut output, "📦", "Resources");

        let mut table = create_table();
        table.set_header(cyan_header(&["#", "Kind", "Name", "Resource", "Group", "Status"]));
        for resource in &report.resources {
            table.add_row(vec![
                comfy_table::Cell::new(resource.index),
                comfy_table::Cell::new(&resource.kind),
                comfy_table::Cell::new(&resource.name),
                comfy_table::Cell::new(&resource.resource),
                group_cell(resource.group),
                status_cell(resource.created, resource.failed),
            ]);
        }
        let _ = writeln!(output, "{table}\n");
    }

    if !report.errors.is_empty() {
        add_section_header(&mut output, "⚠️", "Errors");

        let mut table = create_table();
        table.set_header(cyan_header(&["Class", "Message"]));
        for error in &report.errors {
            table.add_row(vec![
                error_class_cell(error.class),
                comfy_table::Cell::new(&error.message),
            ]);
        }
        let _ = writeln!(output, "{table}\n");
    }

    output
}
