use std::collections::BTreeMap;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use catmig_report::{CategoryStats, MigrationReport};

/// Most frequent unresolved codes shown per run.
const MAX_UNRESOLVED_ROWS: usize = 20;

pub fn print_summary(report: &MigrationReport) {
    println!("{}", totals_table(report));
    if let Some(table) = category_table("Failure", &report.failures, Color::Red) {
        println!();
        println!("Failures:");
        println!("{table}");
    }
    if let Some(table) = category_table("Warning", &report.warnings, Color::Yellow) {
        println!();
        println!("Warnings:");
        println!("{table}");
    }
    if let Some(table) = unresolved_table(report) {
        println!();
        println!("Unresolved lookups:");
        println!("{table}");
    }
}

/// One row per counter, plus the run duration when the run finished.
pub fn totals_table(report: &MigrationReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Object type"),
        header_cell("Processed"),
        header_cell("Succeeded"),
        header_cell("Retryable"),
        header_cell("Permanent"),
        header_cell("Duration"),
    ]);
    apply_table_style(&mut table);
    for index in 1..=4 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    let duration = report.finished_at.map_or_else(
        || dim_cell("-"),
        |finished| {
            let elapsed = finished - report.started_at;
            Cell::new(format!("{:.2}s", elapsed.num_milliseconds() as f64 / 1000.0))
        },
    );
    table.add_row(vec![
        Cell::new(report.object_type.label())
            .fg(Color::Blue)
            .add_attribute(Attribute::Bold),
        Cell::new(report.processed),
        count_cell(report.succeeded, Color::Green),
        count_cell(report.failed_retryable, Color::Yellow),
        count_cell(report.failed_permanent, Color::Red),
        duration,
    ]);
    table
}

/// Categories by descending count; `None` when there are none.
pub fn category_table(
    label: &str,
    categories: &BTreeMap<String, CategoryStats>,
    color: Color,
) -> Option<Table> {
    if categories.is_empty() {
        return None;
    }
    let mut ordered: Vec<(&String, &CategoryStats)> = categories.iter().collect();
    ordered.sort_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(b.0)));

    let mut table = Table::new();
    table.set_header(vec![
        header_cell(label),
        header_cell("Count"),
        header_cell("Examples"),
    ]);
    apply_detail_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (category, stats) in ordered {
        table.add_row(vec![
            Cell::new(category),
            Cell::new(stats.count).fg(color),
            example_cell(&stats.examples),
        ]);
    }
    Some(table)
}

pub fn unresolved_table(report: &MigrationReport) -> Option<Table> {
    let mut rows: Vec<(&str, &str, u64)> = report
        .unresolved_lookups
        .iter()
        .flat_map(|(table, codes)| {
            codes
                .iter()
                .map(move |(code, count)| (table.as_str(), code.as_str(), *count))
        })
        .collect();
    if rows.is_empty() {
        return None;
    }
    rows.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| (a.0, a.1).cmp(&(b.0, b.1))));
    let hidden = rows.len().saturating_sub(MAX_UNRESOLVED_ROWS);

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Table"),
        header_cell("Code"),
        header_cell("Count"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for (name, code, count) in rows.into_iter().take(MAX_UNRESOLVED_ROWS) {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(code),
            Cell::new(count).fg(Color::Yellow),
        ]);
    }
    if hidden > 0 {
        table.add_row(vec![
            dim_cell("..."),
            dim_cell(format!("{hidden} more")),
            dim_cell("-"),
        ]);
    }
    Some(table)
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_detail_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
    if table.column_count() >= 3 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Percentage(30)),
            ColumnConstraint::LowerBoundary(Width::Fixed(7)),
            ColumnConstraint::UpperBoundary(Width::Percentage(60)),
        ]);
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn count_cell(count: u64, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn example_cell(examples: &[String]) -> Cell {
    if examples.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(examples.join("\n"))
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
