use std::io::{self, Write};

use comfy_table::{presets, CellAlignment, Table};
use publicizer::WriteWarning;

use crate::run::RunSummary;

/// Print the changed counts and the output path to stdout.
pub fn print_summary(summary: &RunSummary) {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_header(vec!["", "changed", "total"]);

    let rows = [
        ("types", summary.changed.types, summary.inventory.types),
        ("methods", summary.changed.methods, summary.inventory.methods),
        ("fields", summary.changed.fields, summary.inventory.fields),
    ];
    for (kind, changed, total) in rows {
        table.add_row(vec![kind.to_string(), changed.to_string(), total.to_string()]);
    }
    for index in 1..3 {
        if let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }

    println!("Publicized {}", summary.module_name);
    println!("{table}");
    println!(
        "Written to {} ({})",
        summary.report.path.display(),
        summary.report.strategy
    );
}

/// Print the warnings of a write to stderr, independent of the log filter.
pub fn print_warnings(warnings: &[WriteWarning]) {
    let _ = write_warnings(&mut io::stderr().lock(), warnings);
}

fn write_warnings<W: Write>(out: &mut W, warnings: &[WriteWarning]) -> io::Result<()> {
    for warning in warnings {
        writeln!(out, "warning: {warning}")?;
    }
    Ok(())
}
