//! Plain-text rendering for terminal output

use crate::post::{ConsolidatedTable, COLUMNS};

/// Columns holding numbers, right-aligned when rendered
const NUMERIC_COLUMNS: [usize; 8] = [1, 4, 5, 6, 7, 8, 9, 10];

/// Render the table as aligned text with a leading row index column
pub fn render_table(table: &ConsolidatedTable) -> String {
    let body: Vec<(String, [String; 12])> = table
        .iter()
        .map(|row| (row.index.to_string(), row.cells()))
        .collect();

    let index_width = body.iter().map(|(idx, _)| idx.len()).max().unwrap_or(0);
    let mut widths: Vec<usize> = COLUMNS.iter().map(|c| c.chars().count()).collect();
    for (_, cells) in &body {
        for (width, cell) in widths.iter_mut().zip(cells.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(
        &mut out,
        "",
        index_width,
        COLUMNS.iter().map(|c| c.to_string()),
        &widths,
    );
    for (idx, cells) in body {
        push_line(&mut out, &idx, index_width, cells.into_iter(), &widths);
    }
    out
}

fn push_line(
    out: &mut String,
    index: &str,
    index_width: usize,
    cells: impl Iterator<Item = String>,
    widths: &[usize],
) {
    let mut line = format!("{:>width$}", index, width = index_width);
    for (col, (cell, &width)) in cells.zip(widths).enumerate() {
        line.push_str("  ");
        if NUMERIC_COLUMNS.contains(&col) {
            line.push_str(&format!("{:>width$}", cell, width = width));
        } else {
            line.push_str(&format!("{:<width$}", cell, width = width));
        }
    }
    out.push_str(line.trim_end());
    out.push('\n');
}
